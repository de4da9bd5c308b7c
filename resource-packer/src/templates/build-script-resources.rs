// Generated by resource-packer {{version}}. Do not edit.
//
// Resolve entries with `packed_resources::lookup({{{symbol}}}, id)`.

pub static {{{symbol}}}: &[u8] = include_bytes!(r#"{{{container_path}}}"#);
{{#each resources}}
pub const {{{this.name}}}: i32 = {{this.id}};
{{/each}}
