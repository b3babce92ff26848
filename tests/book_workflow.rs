// Tagging workflow against a scripted reader: find tags, check they are
// blank, write one record per part, read it back.

mod common;

use common::{read_reply, session};
use dlp_rfid2::{LibraryTagRecord, Protocol, TagRead, UsageType};

#[test]
fn tag_two_part_item() {
    let inventory = "[0807060504030201,40]\r\n[z]\r\n[1112131415161718,38]\r\n";
    let blank = read_reply(&[0u8; 32]);
    let mut replies = vec![inventory.to_string(), blank.clone(), blank];
    replies.extend(std::iter::repeat("[00]\r\n".to_string()).take(16));
    let mut reader = session(Protocol::Iso15693, &replies);

    let tags: Vec<_> = reader.inventory_iso15693(false).unwrap().collect();
    assert_eq!(tags.len(), 2);

    for tag in &tags {
        match reader.read_record(&tag.uid).unwrap() {
            TagRead::Record(decoded) => assert!(decoded.is_blank),
            other => panic!("expected blank tag, got {:?}", other),
        }
    }

    for (partno, tag) in (1u8..).zip(&tags) {
        let record = LibraryTagRecord::item("978827020", partno, tags.len() as u8, "NO", "1030310");
        assert!(reader.write_record_to_tag(&tag.uid, &record).unwrap());
    }

    let sent = reader.into_transport().sent;
    // 5 setup, 1 inventory, 2 reads, 16 block writes
    assert_eq!(sent.len(), 24);
    assert!(sent[6].contains("2023010203040506070800"));
    assert!(sent[7].contains("2023181716151413121100"));
}

#[test]
fn read_back_written_item() {
    let record = LibraryTagRecord::item("978827020", 2, 3, "DK", "775100");
    let reply = read_reply(&record.encode());
    let mut reader = session(Protocol::Iso15693, &[reply]);

    let uid = "0102030405060708".parse().unwrap();
    let TagRead::Record(decoded) = reader.read_record(&uid).unwrap() else {
        panic!("expected a record");
    };
    assert!(decoded.checksum_valid);
    assert_eq!(decoded.record.usage_type, UsageType::ForCirculation);
    assert_eq!(decoded.record.item_id, "978827020");
    assert_eq!(decoded.record.partno, 2);
    assert_eq!(decoded.record.nparts, 3);
    assert_eq!(decoded.record.country, "DK");
    assert_eq!(decoded.record.library_number, "775100");
}

#[test]
fn corrupted_record_is_reported_not_fatal() {
    let mut data = LibraryTagRecord::item("978827020", 1, 1, "NO", "1030310").encode();
    data[4] = b'X';
    let mut reader = session(Protocol::Iso15693, &[read_reply(&data)]);

    let uid = "0102030405060708".parse().unwrap();
    match reader.read_record(&uid).unwrap() {
        TagRead::Record(decoded) => {
            assert!(!decoded.checksum_valid);
            assert_eq!(decoded.record.item_id, "9X8827020");
        }
        other => panic!("expected a record, got {:?}", other),
    }
}

#[test]
fn erase_then_read_blank() {
    let mut replies: Vec<String> = std::iter::repeat("[00]".to_string()).take(8).collect();
    replies.push(read_reply(&[0u8; 32]));
    let mut reader = session(Protocol::Iso15693, &replies);

    let uid = "E004015012345678".parse().unwrap();
    assert!(reader.erase_tag(&uid).unwrap());
    let TagRead::Record(decoded) = reader.read_record(&uid).unwrap() else {
        panic!("expected a record");
    };
    assert!(decoded.is_blank);
}
