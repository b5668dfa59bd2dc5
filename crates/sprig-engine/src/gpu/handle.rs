use slotmap::new_key_type;

new_key_type! {
    /// Opaque reference to a linked shader program.
    pub struct ShaderHandle;

    /// Opaque reference to a GPU texture.
    ///
    /// `TextureHandle::default()` is the null handle; no backend ever returns it.
    pub struct TextureHandle;

    /// Opaque reference to a GPU vertex or index buffer.
    pub struct BufferHandle;
}
