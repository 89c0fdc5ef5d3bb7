#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum CallDir {
    /// Call offered by the network
    Incoming,
    /// Call dialled by us
    Outgoing,
}

impl CallDir {
    #[inline]
    pub fn is_incoming(&self) -> bool {
        matches!(self, CallDir::Incoming)
    }

    #[inline]
    pub fn is_outgoing(&self) -> bool {
        matches!(self, CallDir::Outgoing)
    }
}
