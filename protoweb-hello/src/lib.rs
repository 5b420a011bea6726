//! Generated types for `proto/hello.proto`.

use std::sync::LazyLock;

use prost_reflect::DescriptorPool;

pub static DESCRIPTOR_POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::decode(
        include_bytes!(concat!(env!("OUT_DIR"), "/hello_descriptor.bin")).as_ref(),
    )
    .expect("descriptor set written by build.rs")
});

pub mod hello {
    include!(concat!(env!("OUT_DIR"), "/hello.rs"));
}

pub use hello::*;

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::ReflectMessage;

    #[test]
    fn test_messages_resolve_in_pool() {
        assert_eq!(HelloRequest::default().descriptor().full_name(), "hello.HelloRequest");
        assert_eq!(Greeting::default().descriptor().full_name(), "hello.Greeting");
        let field = Greeting::default().descriptor().get_field_by_name("repeat_count").unwrap();
        assert_eq!(field.json_name(), "repeatCount");
    }
}
