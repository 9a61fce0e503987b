//! Overlay state and toggle control seam

/// Overlay availability and visibility.
///
/// `visible` is only ever true while `capable` is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub capable: bool,
    pub visible: bool,
}

/// Checkbox-style control that shows or hides the mask
pub trait OverlayToggle {
    fn set_enabled(&mut self, enabled: bool);
    fn set_checked(&mut self, checked: bool);
    fn set_label(&mut self, label: &str);
}
