use anyhow::Result;

use vergen_gix::{BuildBuilder, Emitter, GixBuilder, RustcBuilder};
fn main() -> Result<()> {
    let build = BuildBuilder::all_build()?;
    let gitcl = GixBuilder::all_git()?;
    let rustc = RustcBuilder::all_rustc()?;
    // Outside a git checkout the gix instructions fall back to placeholder values.
    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&gitcl)?
        .add_instructions(&rustc)?
        .emit()?;
    Ok(())
}
