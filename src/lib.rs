#![doc = r#"
btorir — a BTOR IR dialect with BTOR2 translations.

This crate models BTOR2 transition systems as a small SSA dialect: a module
with an `init` block computing the initial state values and a `next` block
mapping the current states (its block arguments) to their successors, with
`constraint` and `assert_not` operations carrying the model's properties.
It powers the `btorir-translate` CLI and can be embedded in your own Rust
applications.

Quick start: translate a BTOR2 model
------------------------------------
```rust
use btorir::api::translate_to_string;

fn main() -> btorir::Result<()> {
    let counter = "\
1 sort bitvec 4
2 zero 1
3 state 1
4 init 1 3 2
5 one 1
6 add 1 3 5
7 next 1 3 6
";
    let ir = translate_to_string(counter, "import-btor")?;
    assert!(ir.starts_with("module {"));
    Ok(())
}
```

Working with modules directly
-----------------------------
```rust
use btorir::ir::{parse_module, print_module, verify};

fn main() -> btorir::Result<()> {
    let text = "\
module {
  init {
    %0 = btor.constant 0 : bv<4>
    yield %0
  }
  next(%arg0: bv<4>) {
    %0 = btor.constant 1 : bv<4>
    %1 = btor.add %arg0, %0 : bv<4>
    yield %1
  }
}
";
    let module = parse_module(text)?;
    verify(&module)?;
    assert_eq!(print_module(&module)?, text);
    Ok(())
}
```

Registering and running translations
------------------------------------
The CLI driver works off a registry keyed by translation name. Library users
get the same registry through [`translate::register_all_translations`] and
[`translate::lookup`], or the [`api`] helpers which handle registration for
them.

Error handling
--------------
All public functions return `btorir::Result<T>`; match on `btorir::Error` to
handle specific cases, e.g. BTOR2 parse errors or verification failures.

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`btor2`] — the BTOR2 text front end.
- [`ir`] — the dialect: sorts, operations, modules, verifier, printer, parser.
- [`translate`] — the translation registry and the shipped translations.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod btor2;
pub mod error;
pub mod ir;
pub mod translate;

// Curated public API surface
pub use error::{Error, Result};
pub use ir::{Module, Sort};
pub use translate::{
    Translation, TranslationFn, apply_translation, export_btor, import_btor,
    register_all_translations, register_translation,
};
