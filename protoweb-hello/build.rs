use std::path::PathBuf;

use prost::Message;

const DESCRIPTOR_POOL: &str = "crate::DESCRIPTOR_POOL";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let file_descriptor_set = protox::compile(["hello.proto"], ["proto"])?;
    std::fs::write(
        out_dir.join("hello_descriptor.bin"),
        file_descriptor_set.encode_to_vec(),
    )?;

    // Every message gets a ReflectMessage impl backed by the embedded pool.
    let mut config = prost_build::Config::new();
    for file in &file_descriptor_set.file {
        for message in &file.message_type {
            let full_name = format!("{}.{}", file.package(), message.name());
            let path = format!(".{full_name}");
            config.type_attribute(&path, "#[derive(::prost_reflect::ReflectMessage)]");
            config.type_attribute(
                &path,
                format!(
                    r#"#[prost_reflect(descriptor_pool = "{DESCRIPTOR_POOL}", message_name = "{full_name}")]"#
                ),
            );
        }
    }
    config.compile_fds(file_descriptor_set)?;

    Ok(())
}
