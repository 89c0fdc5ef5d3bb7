/// How the units in a charging indication were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeType {
    #[default]
    Invalid,
    /// Advice of charge during the call, reported by the network
    Aocd,
    /// Advice of charge at the end of the call, reported by the network
    Aoce,
    /// Estimated locally from the configured unit length
    Calculated,
}

impl ChargeType {
    pub fn to_int(self) -> i32 {
        match self {
            ChargeType::Invalid => 0,
            ChargeType::Aocd => 1,
            ChargeType::Aoce => 2,
            ChargeType::Calculated => 3,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(ChargeType::Invalid),
            1 => Some(ChargeType::Aocd),
            2 => Some(ChargeType::Aoce),
            3 => Some(ChargeType::Calculated),
            _ => None,
        }
    }
}

/// Accounting record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcctType {
    /// Periodic report while the call is up
    During,
    /// Final report at disconnect
    Final,
}

impl AcctType {
    pub fn to_int(self) -> i32 {
        match self {
            AcctType::During => 0,
            AcctType::Final => 1,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(AcctType::During),
            1 => Some(AcctType::Final),
            _ => None,
        }
    }
}

/// Layer reported in a layer 1/2 status indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    One,
    Two,
}

impl Layer {
    pub fn to_int(self) -> i32 {
        match self {
            Layer::One => 1,
            Layer::Two => 2,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            1 => Some(Layer::One),
            2 => Some(Layer::Two),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Idle,
    Active,
}

impl LayerState {
    pub fn to_int(self) -> i32 {
        match self {
            LayerState::Idle => 0,
            LayerState::Active => 1,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(LayerState::Idle),
            1 => Some(LayerState::Active),
            _ => None,
        }
    }
}

/// Controller event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlEvent {
    Detach,
    Attach,
}

impl CtrlEvent {
    pub fn to_int(self) -> i32 {
        match self {
            CtrlEvent::Detach => 0,
            CtrlEvent::Attach => 1,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(CtrlEvent::Detach),
            1 => Some(CtrlEvent::Attach),
            _ => None,
        }
    }
}

/// Direction of a logged packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDir {
    Out,
    In,
}

impl PacketDir {
    pub fn to_int(self) -> i32 {
        match self {
            PacketDir::Out => 0,
            PacketDir::In => 1,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(PacketDir::Out),
            1 => Some(PacketDir::In),
            _ => None,
        }
    }
}
