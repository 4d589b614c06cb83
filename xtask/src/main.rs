/// Packaging entry point. Builds the EQ as a cdylib and lays out the
/// `.clap` and `.vst3` bundles:
///
///   cargo xtask bundle loveless-eq-v1 --release
///
/// Output lands in `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
