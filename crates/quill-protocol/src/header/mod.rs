//! Bit-packed header carried by every [`WireMessage`](crate::WireMessage).
//!
//! Layout of the 32-bit header word:
//!
//! ```text
//! | Byte 3   | Byte 2   | Byte 1   | Byte 0   |
//! |----------|----------|----------|----------|
//! |          |          |          |     1111 | source: who sent the message
//! |          |          |          | 1111     | kind: request or response
//! |          |          | 11111111 |          | action code
//! | 11111111 | 11111111 |          |          | reserved, zero on encode
//! ```
//!
//! Reserved bits are never written and are ignored when decoding so that
//! newer peers can extend the header without breaking older ones.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HeaderError;

const SOURCE_MASK: u32 = 0x0000_000F;
const SOURCE_SHIFT: u32 = SOURCE_MASK.trailing_zeros();
const KIND_MASK: u32 = 0x0000_00F0;
const KIND_SHIFT: u32 = KIND_MASK.trailing_zeros();
const ACTION_MASK: u32 = 0x0000_FF00;
const ACTION_SHIFT: u32 = ACTION_MASK.trailing_zeros();

/// Bits of the header word that carry defined fields.
pub const FIELD_MASK: u32 = SOURCE_MASK | KIND_MASK | ACTION_MASK;

/// Sender of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The out-of-process suggestion provider.
    Plugin = 1,
    /// The application consuming suggestions.
    Host = 2,
}

impl Source {
    const fn code(self) -> u32 {
        self as u32
    }

    const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Plugin),
            2 => Some(Self::Host),
            _ => None,
        }
    }
}

/// Whether a message asks for something or answers a previous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A request expecting a correlated response.
    Request = 1,
    /// A response echoing the correlation id of its request.
    Response = 2,
}

impl MessageKind {
    const fn code(self) -> u32 {
        self as u32
    }

    const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Request),
            2 => Some(Self::Response),
            _ => None,
        }
    }
}

/// Operation addressed by a message.
///
/// The set is closed: adding an action forces every handler table to be
/// updated because dispatch matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Ask whether a subtype is supported.
    EvaluateSupport = 1,
    /// Load resources for a subtype ahead of use.
    Preload = 2,
    /// Spell-check a single word.
    Spell = 3,
    /// Produce suggestion candidates for the composing word.
    Suggest = 4,
    /// Tell the provider a candidate was committed.
    NotifyAccepted = 5,
    /// Tell the provider a committed candidate was undone.
    NotifyReverted = 6,
    /// Ask the provider to stop offering a candidate.
    RemoveSuggestion = 7,
}

impl Action {
    /// Every action, in code order.
    pub const ALL: [Self; 7] = [
        Self::EvaluateSupport,
        Self::Preload,
        Self::Spell,
        Self::Suggest,
        Self::NotifyAccepted,
        Self::NotifyReverted,
        Self::RemoveSuggestion,
    ];

    /// Returns the eight-bit wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns a stable lowercase label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EvaluateSupport => "evaluate_support",
            Self::Preload => "preload",
            Self::Spell => "spell",
            Self::Suggest => "suggest",
            Self::NotifyAccepted => "notify_accepted",
            Self::NotifyReverted => "notify_reverted",
            Self::RemoveSuggestion => "remove_suggestion",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = HeaderError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|action| action.code() == code)
            .ok_or(HeaderError::UnknownAction { code })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Decoded header fields.
///
/// The action stays a raw code so unknown actions from newer peers can be
/// reported with their value instead of failing the whole decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    /// Sender of the message.
    pub source: Source,
    /// Request or response.
    pub kind: MessageKind,
    /// Raw action code.
    pub action: u8,
}

impl HeaderFields {
    /// Resolves the raw action code into an [`Action`].
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::UnknownAction`] when the code is not defined.
    pub fn action(&self) -> Result<Action, HeaderError> {
        Action::try_from(self.action)
    }
}

/// The packed 32-bit header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(u32);

impl Header {
    /// Packs the three fields into their bit positions.
    ///
    /// Reserved bits are always zero in the result.
    #[must_use]
    pub const fn encode(source: Source, kind: MessageKind, action: u8) -> Self {
        let action_bits = action as u32;
        Self(
            ((source.code() << SOURCE_SHIFT) & SOURCE_MASK)
                | ((kind.code() << KIND_SHIFT) & KIND_MASK)
                | ((action_bits << ACTION_SHIFT) & ACTION_MASK),
        )
    }

    /// Wraps a header word received from the transport.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the header word as sent on the wire.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the bits outside the defined fields.
    #[must_use]
    pub const fn reserved_bits(self) -> u32 {
        self.0 & !FIELD_MASK
    }

    /// Returns the raw action code without validating the other fields.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the action field is masked to eight bits before the cast"
    )]
    pub const fn action_code(self) -> u8 {
        ((self.0 & ACTION_MASK) >> ACTION_SHIFT) as u8
    }

    /// Unpacks the fields, ignoring reserved bits.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::UnknownSource`] or
    /// [`HeaderError::UnknownKind`] when a nibble holds an undefined value.
    pub fn decode(self) -> Result<HeaderFields, HeaderError> {
        let source_code = (self.0 & SOURCE_MASK) >> SOURCE_SHIFT;
        let kind_code = (self.0 & KIND_MASK) >> KIND_SHIFT;
        let source = Source::from_code(source_code).ok_or(HeaderError::UnknownSource {
            code: source_code,
        })?;
        let kind =
            MessageKind::from_code(kind_code).ok_or(HeaderError::UnknownKind { code: kind_code })?;
        Ok(HeaderFields {
            source,
            kind,
            action: self.action_code(),
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests;
