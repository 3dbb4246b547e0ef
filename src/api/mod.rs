//! High-level, ergonomic library API: run a registered translation over
//! strings or files without touching the driver plumbing. Prefer these
//! entrypoints over the `translate` module internals when embedding the
//! translations in another application.
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::translate::{self, Translation, apply_translation, register_all_translations};

fn resolve(name: &str) -> Result<Translation> {
    register_all_translations();
    translate::lookup(name).ok_or_else(|| Error::UnknownTranslation {
        name: name.to_string(),
    })
}

/// Names and descriptions of every registered translation, ordered by name.
pub fn available_translations() -> Vec<(&'static str, &'static str)> {
    register_all_translations();
    translate::translations()
        .into_iter()
        .map(|translation| (translation.name, translation.description))
        .collect()
}

/// Run the named translation over a string and return the result.
pub fn translate_to_string(input: &str, translation: &str) -> Result<String> {
    let translation = resolve(translation)?;
    apply_translation(&translation, input, true)
}

/// Run the named translation over a file, writing the result to `output`.
pub fn translate_file(input: &Path, output: &Path, translation: &str) -> Result<()> {
    let translation = resolve(translation)?;
    let text = fs::read_to_string(input)?;
    let result = apply_translation(&translation, &text, true)?;
    fs::write(output, result)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = "\
1 sort bitvec 4
2 zero 1
3 state 1
4 init 1 3 2
5 one 1
6 add 1 3 5
7 next 1 3 6
8 ones 1
9 eq 1 3 8
10 bad 9
";

    #[test]
    fn translates_between_formats() {
        let text = translate_to_string(COUNTER, "import-btor").unwrap();
        assert!(text.starts_with("module {"));
        let back = translate_to_string(&text, "export-btor").unwrap();
        let model = crate::btor2::Model::parse(&back).unwrap();
        assert_eq!(model.bads.len(), 1);
    }

    #[test]
    fn unknown_translation_is_an_error() {
        let err = translate_to_string(COUNTER, "to-coq").unwrap_err();
        assert!(matches!(err, Error::UnknownTranslation { .. }));
    }

    #[test]
    fn lists_available_translations() {
        let names: Vec<&str> = available_translations()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert!(names.contains(&"import-btor"));
        assert!(names.contains(&"export-btor"));
    }

    #[test]
    fn translates_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("counter.btor2");
        let output = dir.path().join("counter.ir");
        fs::write(&input, COUNTER).unwrap();

        translate_file(&input, &output, "import-btor").unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("btor.assert_not"));
    }
}
