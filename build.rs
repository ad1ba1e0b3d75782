// build.rs
fn main() {
    // Generate build info for netapp_exporter_build_info
    vergen::EmitBuilder::builder()
        .all_build()
        .git_sha(true)
        .emit()
        .expect("Unable to generate build info");
}
