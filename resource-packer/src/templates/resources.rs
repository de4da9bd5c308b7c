// Generated by resource-packer {{version}}. Do not edit.
//
// Resolve entries with `packed_resources::lookup(&{{{symbol}}}, id)`.

pub static {{{symbol}}}: [u8; {{length}}] = [
    {{{bytes}}}
];
{{#each resources}}
pub const {{{this.name}}}: i32 = {{this.id}};
{{/each}}
