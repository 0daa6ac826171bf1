use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use tempfile::NamedTempFile;

use crate::dictionary::{DicEntryBuffer, Dictionary, DictionaryBuilder, FieldSpec};
use crate::test_utils::*;
use crate::Tokenizer;

#[test]
fn test_alias_record_rows() {
    let dict = build_dictionary("x,N,r1\nx,N,r2\nx,N,r3\n");
    let ptrs = lookup_all(&dict, "x");
    assert_eq!(ptrs.len(), 1);
    assert!(ptrs[0].is_alias());

    let entries = dict.entries();
    let reading = dict.fields().field_by_name("reading").unwrap();
    let mut buf = DicEntryBuffer::default();
    entries.fill_buffer(ptrs[0], &mut buf).unwrap();
    let features = buf.features().to_vec();
    assert_eq!(reading.string_of(buf.data()[0]), Some("r1"));
    assert_eq!(buf.remaining_rows(), 2);

    assert!(buf.next_data());
    assert_eq!(buf.features(), &features[..]);
    assert_eq!(reading.string_of(buf.data()[0]), Some("r2"));
    assert!(buf.next_data());
    assert_eq!(buf.features(), &features[..]);
    assert_eq!(reading.string_of(buf.data()[0]), Some("r3"));
    assert!(!buf.next_data());
    assert!(!buf.next_data());
}

#[test]
fn test_plain_record_has_one_row() {
    let dict = build_dictionary(SMALL_LEXICON);
    let ptr = lookup_all(&dict, "ba")[0];
    assert!(!ptr.is_alias());
    let mut buf = DicEntryBuffer::default();
    dict.entries().fill_buffer(ptr, &mut buf).unwrap();
    assert_eq!(buf.remaining_rows(), 0);
    assert!(!buf.next_data());
    assert_eq!(dict.fields().string_of("pos", buf.features()[1]), Some("N"));
}

#[test]
fn test_lookup_misses() {
    let dict = build_dictionary(SMALL_LEXICON);
    assert!(dict.lookup("").is_none());
    assert!(dict.lookup("d").is_none());
    assert!(dict.lookup("bac").is_none());
    assert_eq!(dict.lookup("a").unwrap().count(), 1);
}

#[test]
fn test_trie_traversal_statuses() {
    use crate::dictionary::TraverseStatus;

    let dict = build_dictionary("abc,N,1\na,A,2\n");
    let mut trav = dict.entries().traversal();
    assert_eq!(trav.step(b"a"), TraverseStatus::Ok);
    assert!(trav.entries().is_some());
    assert_eq!(trav.step(b"b"), TraverseStatus::NoLeaf);
    assert!(trav.entries().is_none());
    assert_eq!(trav.step(b"c"), TraverseStatus::Ok);
    assert_eq!(trav.step(b"d"), TraverseStatus::NoNode);
    assert_eq!(trav.step(b"a"), TraverseStatus::NoNode);
}

#[test]
fn test_builder_rejects_bad_rows() {
    let mut builder = DictionaryBuilder::new(vec![
        FieldSpec::feature("surface").surface(),
        FieldSpec::data("reading"),
    ])
    .unwrap();
    assert!(builder.read_csv("a,b,c\n").is_err());
    assert!(builder.read_csv(",x\n").is_err());

    assert!(DictionaryBuilder::new(vec![FieldSpec::feature("pos")]).is_err());
    assert!(DictionaryBuilder::new(vec![FieldSpec::data("surface").surface()]).is_err());
}

#[test]
fn test_write_read_round_trip() {
    let dict = build_dictionary(SMALL_LEXICON);

    let mut file = NamedTempFile::new().unwrap();
    {
        let mut wtr = BufWriter::new(file.as_file_mut());
        dict.write(&mut wtr).unwrap();
        wtr.flush().unwrap();
    }
    let rdr = BufReader::new(File::open(file.path()).unwrap());
    let loaded = Dictionary::read(rdr).unwrap();

    assert_eq!(loaded.fields().num_features(), dict.fields().num_features());
    assert_eq!(lookup_all(&loaded, "ab"), lookup_all(&dict, "ab"));

    let def = zero_scorer();
    let mut surfaces = vec![];
    for d in [dict, loaded] {
        let tokenizer = Tokenizer::new(d);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("bacababa");
        worker.analyze(&def).unwrap();
        surfaces.push(
            worker
                .token_iter()
                .map(|t| t.surface().to_string())
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(surfaces[0], surfaces[1]);
}

#[test]
fn test_read_truncated_file() {
    let dict = build_dictionary(SMALL_LEXICON);
    let mut bytes = vec![];
    dict.write(&mut bytes).unwrap();
    bytes.truncate(bytes.len() / 2);
    assert!(Dictionary::read(bytes.as_slice()).is_err());
}
