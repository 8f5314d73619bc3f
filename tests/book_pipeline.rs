//! The file-to-file steps after OCR, run in order on a small book:
//! merge → split → typeset → merge-final.

use pdf_set::assemble::{self, ROUGH_FILE};
use pdf_set::layout::{self, Selection, TypesetOptions};
use std::path::Path;

fn write(path: &Path, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn book_from_page_transcripts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("origins");
    let ocr = root.join("ocr-result");
    let merged = root.join("merge-result");
    let typeset = root.join("typeset-result");

    write(&ocr.join("0.md"), "# 目录\n第一章 开端\n第二章 远行\n");
    write(
        &ocr.join("1.md"),
        "# 第一章 开端\n那一年的春天来得很早，河面上的冰在三月初就已经已经化开了，\n岸边的柳树也冒出了新芽。\n🀄\n",
    );
    write(&ocr.join("2.fail.md"), "");
    write(
        &ocr.join("10.md"),
        "# 第二章 远行\n<sup>1 这里的远行\n  指的是南下。</sup>\n他说：走走走走吧\n",
    );

    // merge: natural order, the empty marker contributes nothing.
    let rough = merged.join(ROUGH_FILE);
    assert_eq!(assemble::merge_transcripts(&ocr, &rough).unwrap(), 4);
    let rough_text = read(&rough);
    let first = rough_text.find("# 第一章").unwrap();
    let second = rough_text.find("# 第二章").unwrap();
    assert!(first < second);

    // split: one file per H1.
    let chapters = assemble::split_rough(&rough, &merged).unwrap();
    let names: Vec<String> = chapters
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["1.目录.md", "2.第一章 开端.md", "3.第二章 远行.md"]);

    // typeset: every chapter except the rough text.
    let report = layout::typeset_dir(&merged, &typeset, &TypesetOptions::default()).unwrap();
    assert_eq!(report.processed.len(), 3);
    assert!(!typeset.join(ROUGH_FILE).exists());

    assert_eq!(
        read(&typeset.join("1.目录.md")),
        "# 目录\n\n  第一章 开端\n\n第二章 远行\n"
    );

    let chapter_one = read(&typeset.join("2.第一章 开端.md"));
    assert!(chapter_one.starts_with("# 第一章 开端\n\n  那一年的春天"), "{chapter_one}");
    assert!(chapter_one.contains("就已经化开了，岸边的柳树"), "{chapter_one}");

    let chapter_two = read(&typeset.join("3.第二章 远行.md"));
    assert!(chapter_two.contains("<sup>1 这里的远行指的是南下。</sup>"), "{chapter_two}");
    assert!(chapter_two.contains("走走吧"), "{chapter_two}");
    assert!(!chapter_two.contains("走走走"), "{chapter_two}");

    // Typesetting its own output changes nothing.
    let again = dir.path().join("again");
    layout::typeset_dir(&typeset, &again, &TypesetOptions::default()).unwrap();
    for name in &report.processed {
        assert_eq!(read(&again.join(name)), read(&typeset.join(name)), "{name}");
    }

    // merge-final: chapter order, one blank line between chapters.
    let book = root.join("origins.md");
    let order = assemble::merge_final(&typeset, &book).unwrap();
    assert_eq!(order, vec!["1.目录.md", "2.第一章 开端.md", "3.第二章 远行.md"]);
    let book_text = read(&book);
    assert!(book_text.starts_with("# 目录\n\n"));
    assert!(book_text.ends_with("</sup>\n\n他说：走走吧\n"), "{book_text}");
}

#[test]
fn typeset_selected_indices_only() {
    let dir = tempfile::tempdir().unwrap();
    let merged = dir.path().join("merge-result");
    let typeset = dir.path().join("typeset-result");
    write(&merged.join(ROUGH_FILE), "# a\n");
    write(&merged.join("1.序.md"), "# 序\n短句\n");
    write(&merged.join("2.正文.md"), "# 正文\n短句\n");

    let options = TypesetOptions {
        selection: Selection::Indices(vec![2]),
        force_index: false,
    };
    let report = layout::typeset_dir(&merged, &typeset, &options).unwrap();
    assert_eq!(report.processed, vec!["2.正文.md"]);
    assert!(!typeset.join("1.序.md").exists());
    assert_eq!(read(&typeset.join("2.正文.md")), "# 正文\n\n  短句\n");
}

#[test]
fn list_fail_after_merge() {
    let dir = tempfile::tempdir().unwrap();
    let ocr = dir.path().join("ocr-result");
    write(&ocr.join("7.fail.md"), "");
    write(&ocr.join("3.fail.md"), "");
    write(&ocr.join("4.md"), "text");

    let pages = assemble::list_failed_pages(&ocr).unwrap();
    let names: Vec<String> = pages.into_iter().map(assemble::failed_image_name).collect();
    assert_eq!(names, vec!["3.jpg", "7.jpg"]);
}
