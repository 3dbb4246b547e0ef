//! The translation registry and driver plumbing. A translation either parses
//! an external format into a BTOR IR module or serializes a module back out.
//! Translations register under a stable name and the command-line driver picks
//! one by that name.
use std::collections::BTreeMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::Result;
use crate::ir;

pub mod export_btor;
pub mod import_btor;

pub use export_btor::export_btor;
pub use import_btor::import_btor;

/// What a translation does, as a plain function pointer.
#[derive(Copy, Clone)]
pub enum TranslationFn {
    /// Parse an external format into a module.
    ToIr(fn(&str) -> Result<ir::Module>),
    /// Serialize a module into an external format.
    FromIr(fn(&ir::Module) -> Result<String>),
}

/// A named translation known to the driver.
#[derive(Copy, Clone)]
pub struct Translation {
    pub name: &'static str,
    pub description: &'static str,
    pub run: TranslationFn,
}

static REGISTRY: Lazy<RwLock<BTreeMap<&'static str, Translation>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Register one translation. Registering the same name twice keeps the first
/// registration, so repeated initialization is harmless.
pub fn register_translation(translation: Translation) {
    let mut registry = REGISTRY.write().expect("translation registry poisoned");
    registry.entry(translation.name).or_insert(translation);
}

/// Register every translation this crate ships. The entry point calls this
/// once before handing control to the driver.
pub fn register_all_translations() {
    register_translation(Translation {
        name: "import-btor",
        description: "parse a BTOR2 model into BTOR IR",
        run: TranslationFn::ToIr(import_btor),
    });
    register_translation(Translation {
        name: "export-btor",
        description: "serialize BTOR IR back to BTOR2",
        run: TranslationFn::FromIr(export_btor),
    });
}

pub fn lookup(name: &str) -> Option<Translation> {
    let registry = REGISTRY.read().expect("translation registry poisoned");
    registry.get(name).copied()
}

/// All registered translations, ordered by name.
pub fn translations() -> Vec<Translation> {
    let registry = REGISTRY.read().expect("translation registry poisoned");
    registry.values().copied().collect()
}

/// Run one translation over the input text. Modules pass through the verifier
/// on the IR side of the translation unless `verify` is false.
pub fn apply_translation(translation: &Translation, input: &str, verify: bool) -> Result<String> {
    debug!(name = translation.name, verify, "applying translation");
    match translation.run {
        TranslationFn::ToIr(run) => {
            let module = run(input)?;
            if verify {
                ir::verify(&module)?;
            }
            Ok(ir::print_module(&module)?)
        }
        TranslationFn::FromIr(run) => {
            let module = ir::parse_module(input)?;
            if verify {
                ir::verify(&module)?;
            }
            run(&module)
        }
    }
}

impl std::fmt::Debug for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translation")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        register_all_translations();
        register_all_translations();
        let names: Vec<&str> = translations().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["export-btor", "import-btor"]);
    }

    #[test]
    fn lookup_finds_registered_translations() {
        register_all_translations();
        assert!(lookup("import-btor").is_some());
        assert!(lookup("no-such-translation").is_none());
    }

    #[test]
    fn import_then_export_round_trips_a_counter() {
        register_all_translations();
        let source = "\
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
        let importer = lookup("import-btor").unwrap();
        let text = apply_translation(&importer, source, true).unwrap();
        assert!(text.contains("btor.add"));
        assert!(text.contains("btor.assert_not"));

        let exporter = lookup("export-btor").unwrap();
        let back = apply_translation(&exporter, &text, true).unwrap();
        let reparsed = crate::btor2::Model::parse(&back).unwrap();
        assert_eq!(reparsed.states.len(), 1);
        assert_eq!(reparsed.bads.len(), 1);
    }
}
