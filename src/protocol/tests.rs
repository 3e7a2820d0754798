// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::buffer::SegmentedBuffer;
use crate::core::codec::{Encode, WireRead, WireWrite};
use crate::error::Result;
use crate::protocol::dispatcher::{DispatchTable, HandlerKind, PacketHolder, HANDLER_GROWTH};
use crate::protocol::version::{ProtocolVersion, ProtocolVersions};

struct Handler {
    ordinal: u32,
    seen: Vec<u32>,
}

impl HandlerKind for Handler {
    fn handler_ordinal(&self) -> u32 {
        self.ordinal
    }
}

#[derive(Default)]
struct Connection {
    replies: usize,
}

#[test]
fn test_dispatch_invokes_registered_callback_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();

    let counter = calls.clone();
    table.register(3, 7, move |handler, connection, packet| {
        counter.fetch_add(1, Ordering::SeqCst);
        handler.seen.push(packet.ordinal());
        connection.replies += 1;
        true
    });

    let mut handler = Handler {
        ordinal: 3,
        seen: Vec::new(),
    };
    let mut connection = Connection::default();

    assert!(table.dispatch(&mut handler, &mut connection, &PacketHolder::new(7, ())));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.seen, vec![7]);
    assert_eq!(connection.replies, 1);

    // Unregistered packet ordinal
    assert!(!table.dispatch(&mut handler, &mut connection, &PacketHolder::new(8, ())));

    // Unregistered handler ordinal
    let mut other = Handler {
        ordinal: 4,
        seen: Vec::new(),
    };
    assert!(!table.dispatch(&mut other, &mut connection, &PacketHolder::new(7, ())));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(connection.replies, 1);
    assert!(other.seen.is_empty());
}

#[test]
fn test_dispatch_out_of_range_ordinals() {
    let table: DispatchTable<Handler, Connection> = DispatchTable::new();
    let mut handler = Handler {
        ordinal: u32::MAX,
        seen: Vec::new(),
    };
    let mut connection = Connection::default();
    assert!(!table.dispatch(
        &mut handler,
        &mut connection,
        &PacketHolder::new(u32::MAX, ())
    ));
}

#[test]
fn test_callback_verdict_is_returned() {
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();
    table.register(0, 1, |_, _, _| false);

    let mut handler = Handler {
        ordinal: 0,
        seen: Vec::new(),
    };
    let mut connection = Connection::default();
    assert!(table.has_callback(0, 1));
    assert!(!table.dispatch(&mut handler, &mut connection, &PacketHolder::new(1, ())));
}

#[test]
fn test_growth_keeps_earlier_registrations() {
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();
    table.register(10, 2, |_, _, _| true);
    assert_eq!(table.handler_capacity(), 10 + HANDLER_GROWTH);

    // A lower ordinal must not shrink the table.
    table.register(3, 1, |_, _, _| true);
    assert_eq!(table.handler_capacity(), 10 + HANDLER_GROWTH);
    assert!(table.has_callback(10, 2));
    assert!(table.has_callback(3, 1));
    assert!(!table.has_callback(3, 2));
    assert!(!table.has_callback(10 + HANDLER_GROWTH as u32, 0));

    // Past the end of the allocated slots
    table.register(40, 0, |_, _, _| true);
    assert!(table.has_callback(40, 0));
    assert!(table.has_callback(10, 2));
}

#[test]
fn test_packet_slots_follow_largest_ordinal() {
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();
    table.register(0, 999, |_, _, _| true);
    assert_eq!(table.handler_capacity(), HANDLER_GROWTH);
    assert_eq!(table.packet_capacity(0), 1000);
    assert_eq!(table.packet_capacity(1), 0);
    assert_eq!(table.packet_capacity(u32::MAX), 0);

    // lower packet ordinals reuse the existing row
    table.register(0, 3, |_, _, _| true);
    assert_eq!(table.packet_capacity(0), 1000);
}

#[test]
fn test_reregistration_replaces_callback() {
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();
    table.register(1, 1, |_, _, _| false);
    table.register(1, 1, |_, _, _| true);

    let mut handler = Handler {
        ordinal: 1,
        seen: Vec::new(),
    };
    let mut connection = Connection::default();
    let packet = PacketHolder::new(1, ());
    assert!(table.dispatch_to(1, 1, &mut handler, &mut connection, &packet));
}

#[test]
fn test_shared_table_dispatch_after_init() {
    let mut table: DispatchTable<Handler, Connection> = DispatchTable::new();
    table.register(2, 5, |_, connection, _| {
        connection.replies += 1;
        true
    });
    let table = Arc::new(table);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let table = table.clone();
            std::thread::spawn(move || {
                let mut handler = Handler {
                    ordinal: 2,
                    seen: Vec::new(),
                };
                let mut connection = Connection::default();
                for _ in 0..10 {
                    table.dispatch(&mut handler, &mut connection, &PacketHolder::new(5, ()));
                }
                connection.replies
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 10);
    }
}

#[test]
fn test_packet_holder_payload() {
    let holder = PacketHolder::new(9, String::from("chat"));
    assert_eq!(holder.payload::<String>().map(String::as_str), Some("chat"));
    assert!(holder.payload::<u32>().is_none());

    let holder = holder.into_payload::<u32>().unwrap_err();
    assert_eq!(holder.ordinal(), 9);
    assert_eq!(holder.into_payload::<String>().unwrap(), "chat");
}

/// Packet whose layout gained a field in a later protocol revision.
struct SpawnEntity {
    entity_id: u32,
    name: String,
}

impl Encode for SpawnEntity {
    fn encode<W: WireWrite + ?Sized>(&self, version: &ProtocolVersion, out: &mut W) -> Result<()> {
        out.write_var_int(self.entity_id);
        if version.protocol_id() >= 107 {
            out.write_string(&self.name);
        }
        Ok(())
    }
}

#[test]
fn test_version_gated_encoding_and_two_pass_size() {
    let versions = ProtocolVersions::new([
        ProtocolVersion::new(0, 47, "1.8"),
        ProtocolVersion::new(1, 107, "1.9"),
    ])
    .unwrap();

    let packet = SpawnEntity {
        entity_id: 300,
        name: String::from("zombie"),
    };

    let old = versions.from_protocol_id(47);
    let new = versions.from_protocol_id(107);
    assert_eq!(packet.encoded_size(old).unwrap(), 2);
    assert_eq!(packet.encoded_size(new).unwrap(), 2 + 1 + 6);

    let mut buffer = SegmentedBuffer::new(4);
    let size = packet.encoded_size(new).unwrap();
    buffer.write_var_int(size as u32);
    packet.encode(new, &mut buffer).unwrap();

    assert_eq!(buffer.read_var_int().unwrap() as usize, size);
    assert_eq!(buffer.readable_bytes(), size);
    assert_eq!(buffer.read_var_int().unwrap(), 300);
    assert_eq!(buffer.read_string().unwrap(), "zombie");
}
