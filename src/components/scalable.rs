//! Shared scale composition for sprites and stack containers.
//!
//! Both carry a declared scale of their own and a frame scale imposed by the
//! enclosing stack. Stack layout only ever writes the frame scale.

pub trait Scalable {
    fn declared_scale(&self) -> f32;
    fn frame_scale(&self) -> f32;
    fn set_frame_scale(&mut self, factor: f32);

    /// Declared scale times frame scale.
    fn effective_scale(&self) -> f32 {
        self.declared_scale() * self.frame_scale()
    }
}
