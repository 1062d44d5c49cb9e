use std::sync::Arc;

use thai_ocr_fix::{
    AddOutcome, CorrectionDictionary, CorrectionSource, DictionaryError, DocumentRef, InMemoryPhraseStore,
    Pipeline, PhraseInstanceRecord, PhraseRepository, PhraseStatus, PostProcessOptions, Priority, RuleKind,
    aggregate_phrases, apply_group_correction, convert_parentheses_to_negative, fix_spacing,
    remove_duplicate_marks,
};

fn corrected(pipeline: &Pipeline, text: &str) -> String {
    pipeline.postprocess(text, &PostProcessOptions::default()).corrected
}

#[test]
fn end_to_end_financial_line() {
    let pipeline = Pipeline::default();
    assert_eq!(
        corrected(&pipeline, "การปรับปรุงด วยค่าใช จ่ายภาษี เงินได"),
        "การปรับปรุงด้วยค่าใช้จ่ายภาษีเงินได้"
    );
}

#[test]
fn postprocess_is_idempotent() {
    let pipeline = Pipeline::default();
    for text in [
        "การปรับปรุงด วยค่าใช จ่ายภาษี เงินได",
        "กําไรสุทธิ (1,234.50)",
        "บริษัท จํากัด",
        "เจ้าหนีการค า 2566",
        "Total (note 3)",
        "ภาษีเงินได (1,000)",
        "เงินได ค่า",
    ] {
        let once = corrected(&pipeline, text);
        let twice = corrected(&pipeline, &once);
        assert_eq!(once, twice, "input: {text}");
    }
}

#[test]
fn every_builtin_replacement_is_stable_in_context() {
    let pipeline = Pipeline::default();
    let rules = pipeline.dictionary().rules();
    for rule in rules.iter().filter(|r| r.kind == RuleKind::Substring) {
        let word = &rule.replacement;
        for text in [
            format!("{word} ค่า"),
            format!("{word} (1,000)"),
            format!("{word} 2566"),
            format!("| {word} | (12,500) |"),
        ] {
            let once = corrected(&pipeline, &text);
            assert_eq!(corrected(&pipeline, &once), once, "input: {text}");
        }
    }
}

#[test]
fn table_cells_keep_composed_sara_am() {
    let pipeline = Pipeline::default();
    let markdown = "| รายการ | 2566 |\n|---|---|\n| กําไรสุทธิ | (1,234.50) |\n| ภาษีเงินได | (300) |\n";
    let once = pipeline.postprocess_markdown(markdown);
    assert_eq!(
        once,
        "| รายการ | 2566 |\n|---|---|\n| กำไรสุทธิ| -1,234.50 |\n| ภาษีเงินได้| -300 |\n"
    );
    assert!(!once.contains('\u{0e4d}'));
    assert_eq!(pipeline.postprocess_markdown(&once), once);
}

#[test]
fn spacing_reattaches_tone_mark() {
    assert_eq!(fix_spacing("อ ้อม"), "อ้อม");
}

#[test]
fn longest_pattern_wins() {
    let dictionary = CorrectionDictionary::new();
    dictionary.add_correction("เจ้าหนี", "เจ้าหนี้").unwrap();
    dictionary.add_correction("เจ้าหนีการค า", "เจ้าหนี้การค้า").unwrap();
    let (text, count) = dictionary.apply("เจ้าหนีการค า");
    assert_eq!(text, "เจ้าหนี้การค้า");
    assert_eq!(count, 1);

    // the built-in rules cover the spacing-repaired spelling too
    assert_eq!(corrected(&Pipeline::default(), "เจ้าหนีการค า"), "เจ้าหนี้การค้า");
}

#[test]
fn parenthesized_numbers_become_negative() {
    assert_eq!(
        convert_parentheses_to_negative("(1,234,567.89)"),
        ("-1,234,567.89".to_string(), 1)
    );
    assert_eq!(convert_parentheses_to_negative("(note 3)"), ("(note 3)".to_string(), 0));
}

#[test]
fn duplicate_marks_collapse() {
    assert_eq!(remove_duplicate_marks("เจ้าหนี้้"), "เจ้าหนี้");
}

#[test]
fn conflicting_rule_is_rejected() {
    let dictionary = Arc::new(CorrectionDictionary::new());
    assert_eq!(dictionary.add_correction("จํากัด", "จำกัด").unwrap(), AddOutcome::Inserted);

    let err = dictionary.add_correction("จํากัด", "DIFFERENT").unwrap_err();
    assert!(matches!(err, DictionaryError::Conflict { ref existing, .. } if existing == "จำกัด"));

    let pipeline = Pipeline::new(Arc::clone(&dictionary));
    assert_eq!(corrected(&pipeline, "จํากัด"), "จำกัด");
}

fn instance(id: i64, document_id: i64, needs_correction: bool) -> PhraseInstanceRecord {
    PhraseInstanceRecord {
        confidence_score: Some(0.7),
        needs_correction,
        document_id: Some(document_id),
        document: Some(DocumentRef {
            file_name: Some(format!("report_{document_id}.pdf")),
            ..DocumentRef::default()
        }),
        ..PhraseInstanceRecord::new(id, "ค่าใช จ่ายล่วงหน้า")
    }
}

#[test]
fn aggregation_groups_across_documents() {
    let instances = vec![
        instance(1, 1, false),
        instance(2, 1, false),
        instance(3, 2, true),
        instance(4, 2, false),
        instance(5, 3, false),
    ];
    let aggregation = aggregate_phrases(&instances, &CorrectionDictionary::new());

    assert_eq!(aggregation.groups.len(), 1);
    let group = &aggregation.groups[0];
    assert_eq!(group.group_size, 5);
    assert_eq!(group.source_documents.len(), 3);
    assert!(group.needs_correction);
    assert_eq!(group.priority, Priority::HighMultiFile);
    assert_eq!(aggregation.stats.reduced_by, 4);
}

#[test]
fn group_correction_reaches_every_instance() {
    let store = InMemoryPhraseStore::from_records((1..=5).map(|id| instance(id, id, false)).collect());

    let updated = apply_group_correction(&store, "ค่าใช จ่ายล่วงหน้า", "ค่าใช้จ่ายล่วงหน้า").unwrap();
    assert_eq!(updated, 5);
    for record in store.instances() {
        assert!(record.needs_correction);
        assert_eq!(record.status, PhraseStatus::Reviewed);
        assert_eq!(record.correction_suggestion.as_deref(), Some("ค่าใช้จ่ายล่วงหน้า"));
    }

    let aggregation = aggregate_phrases(&store.instances(), &CorrectionDictionary::new());
    let group = &aggregation.groups[0];
    assert_eq!(group.final_correction.as_deref(), Some("ค่าใช้จ่ายล่วงหน้า"));
    assert_eq!(group.correction_source, CorrectionSource::PhraseSuggestion);
}
