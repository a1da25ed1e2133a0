/// Frame timing snapshot handed to `Module::update`.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub frame_index: u64,
    /// Seconds since the previous step.
    pub dt: f32,
}
