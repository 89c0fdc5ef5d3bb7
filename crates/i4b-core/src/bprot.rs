use serde::Deserialize;

/// B-channel layer 2 protocol negotiated for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BProt {
    /// Transparent, no framing (voice)
    #[default]
    Raw,
    /// HDLC framing (data)
    Hdlc,
}

impl BProt {
    pub fn to_int(self) -> i32 {
        match self {
            BProt::Raw => 0,
            BProt::Hdlc => 1,
        }
    }
}
