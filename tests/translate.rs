//! End-to-end checks over the public library surface.
use std::fs;

use btorir::api;
use btorir::ir::{parse_module, verify};
use btorir::{Error, translate};

const COUNTER: &str = "\
1 sort bitvec 4
2 zero 1
3 state 1 counter
4 init 1 3 2
5 one 1
6 add 1 3 5
7 next 1 3 6
8 ones 1
9 eq 1 3 8
10 bad 9
";

#[test]
fn btor2_to_ir_and_back() {
    let ir_text = api::translate_to_string(COUNTER, "import-btor").unwrap();
    let module = parse_module(&ir_text).unwrap();
    verify(&module).unwrap();

    let btor2 = api::translate_to_string(&ir_text, "export-btor").unwrap();
    let again = api::translate_to_string(&btor2, "import-btor").unwrap();
    assert_eq!(ir_text, again, "second import should reproduce the IR");
}

#[test]
fn translate_file_writes_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("counter.btor2");
    let output = dir.path().join("counter.ir");
    fs::write(&input, COUNTER).unwrap();

    api::translate_file(&input, &output, "import-btor").unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("next(%arg0: bv<4>)"));
    assert!(text.contains("btor.assert_not"));
}

#[test]
fn unknown_translation_name_is_rejected() {
    let err = api::translate_to_string(COUNTER, "export-smt").unwrap_err();
    assert!(matches!(err, Error::UnknownTranslation { .. }));
}

#[test]
fn registry_survives_repeated_registration() {
    translate::register_all_translations();
    translate::register_all_translations();
    let names: Vec<&str> = api::available_translations()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["export-btor", "import-btor"]);
}

#[test]
fn malformed_btor2_reports_the_line() {
    let err = api::translate_to_string("1 sort bitvec 4\n2 frobnicate 1\n", "import-btor")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 2"), "got: {message}");
}
