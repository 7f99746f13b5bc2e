//! Chapter splitting and pretraining chunk packing.

use novel_datagen::source::{
    pack_to_target_length, read_chapters, read_pretrain_chunks, split_by_title,
    LeadingFragment, DEFAULT_TITLE_PATTERN,
};
use novel_datagen::Error;
use regex::Regex;
use std::io::Write;

const NOVEL: &str = "第1章 醒来\n李火旺睁开眼。\n“师兄？”\n\n第2章 药\n丹阳子笑了。\n第3章 回去\n他回到了病房。\n";

#[test]
fn chapters_concatenate_back_to_body_without_titles() {
    let title = Regex::new(DEFAULT_TITLE_PATTERN).unwrap();
    let chapters = split_by_title(NOVEL, None);
    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters.concat(), title.replace_all(NOVEL, "").into_owned());
}

#[test]
fn no_title_yields_the_whole_input() {
    let text = "没有章节标题的一段文字。\n第二行。";
    assert_eq!(split_by_title(text, None), vec![text.to_string()]);
}

#[test]
fn blank_input_yields_nothing() {
    assert!(split_by_title("", None).is_empty());
    assert!(split_by_title("\n \n", None).is_empty());
}

#[test]
fn titles_are_split_mid_line_content() {
    let chapters = split_by_title("第1章 标题\nA说话。第2章 标题\nB说话。", None);
    assert_eq!(chapters, vec!["A说话。", "B说话。"]);
}

#[test]
fn greedy_packing_example() {
    let chunks = pack_to_target_length("abcde\nfghij\nk", 10);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["abcdefghij", "k"]);
}

#[test]
fn packing_preserves_line_sequence_and_never_emits_empty_chunks() {
    for target in [1, 5, 12, 40, 2000] {
        let chunks = pack_to_target_length(NOVEL, target);
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
        let lines: String = NOVEL
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let packed: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(packed, lines, "target {target}");
    }
}

#[test]
fn missing_file_is_source_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_chapters(dir.path().join("novel.txt"), None, LeadingFragment::Keep).unwrap_err();
    assert!(matches!(err, Error::SourceNotFound { .. }));
}

#[test]
fn unreadable_file_is_source_read() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
    let err = read_pretrain_chunks(file.path(), 100).unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));

    let dir = tempfile::tempdir().unwrap();
    let err = read_chapters(dir.path(), None, LeadingFragment::Keep).unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
}

#[test]
fn strict_reading_rejects_preface() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "作者的话\n{}", NOVEL).unwrap();
    let err = read_chapters(file.path(), None, LeadingFragment::Reject).unwrap_err();
    assert!(matches!(err, Error::MalformedSource { .. }));
    assert_eq!(
        read_chapters(file.path(), None, LeadingFragment::Keep).unwrap().len(),
        4
    );
}
