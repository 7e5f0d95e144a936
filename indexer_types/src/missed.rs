/// The result of a beacon-API call that may 404 on a missed slot/block.
///
/// Per spec §7/§9: a missed slot is a *value*, not an error — it must never
/// be modeled as `Err`. `MaybeMissed::Missed` is the `SLOT_MISSED` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybeMissed<T> {
    Present(T),
    Missed,
}

impl<T> MaybeMissed<T> {
    pub fn is_missed(&self) -> bool {
        matches!(self, MaybeMissed::Missed)
    }

    pub fn present(self) -> Option<T> {
        match self {
            MaybeMissed::Present(v) => Some(v),
            MaybeMissed::Missed => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MaybeMissed<U> {
        match self {
            MaybeMissed::Present(v) => MaybeMissed::Present(f(v)),
            MaybeMissed::Missed => MaybeMissed::Missed,
        }
    }
}
