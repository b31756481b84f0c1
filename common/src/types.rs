//! Common Types for 5G NR Waveform Synthesis
//!
//! Defines the fundamental value types shared by the carrier model,
//! the channel allocators and the OFDM synthesizer.

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Radio Network Temporary Identifier (RNTI)
///
/// Retained on channel allocations as metadata only; symbol generation
/// does not consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rnti(pub u16);

impl Rnti {
    /// Create a new RNTI
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the RNTI value
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Physical Cell Identity (0..=1007)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pci(pub u16);

impl Pci {
    /// Maximum valid PCI value
    pub const MAX: u16 = 1007;

    /// Create a new PCI with validation
    pub fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the cell identity value
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Subcarrier spacing values in kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum SubcarrierSpacing {
    /// 15 kHz (mu = 0)
    Scs15 = 15,
    /// 30 kHz (mu = 1)
    Scs30 = 30,
    /// 60 kHz (mu = 2)
    Scs60 = 60,
    /// 120 kHz (mu = 3)
    Scs120 = 120,
    /// 240 kHz (mu = 4)
    Scs240 = 240,
}

impl SubcarrierSpacing {
    /// Derive subcarrier spacing from the numerology index (15 * 2^mu kHz)
    pub fn from_mu(mu: u8) -> Option<Self> {
        match mu {
            0 => Some(Self::Scs15),
            1 => Some(Self::Scs30),
            2 => Some(Self::Scs60),
            3 => Some(Self::Scs120),
            4 => Some(Self::Scs240),
            _ => None,
        }
    }

    /// Numerology index mu
    pub fn mu(&self) -> u8 {
        match self {
            Self::Scs15 => 0,
            Self::Scs30 => 1,
            Self::Scs60 => 2,
            Self::Scs120 => 3,
            Self::Scs240 => 4,
        }
    }

    /// Spacing in kHz
    pub fn as_khz(&self) -> u32 {
        *self as u32
    }

    /// Spacing in Hz
    pub fn as_hz(&self) -> f64 {
        (*self as u32 as f64) * 1e3
    }
}

/// Channel bandwidth values in MHz (FR1 and FR2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bandwidth {
    /// 5 MHz
    Bw5,
    /// 10 MHz
    Bw10,
    /// 15 MHz
    Bw15,
    /// 20 MHz
    Bw20,
    /// 25 MHz
    Bw25,
    /// 30 MHz
    Bw30,
    /// 40 MHz
    Bw40,
    /// 50 MHz
    Bw50,
    /// 60 MHz
    Bw60,
    /// 70 MHz
    Bw70,
    /// 80 MHz
    Bw80,
    /// 90 MHz
    Bw90,
    /// 100 MHz
    Bw100,
    /// 200 MHz (FR2)
    Bw200,
    /// 400 MHz (FR2)
    Bw400,
    /// 800 MHz (FR2-2)
    Bw800,
    /// 1600 MHz (FR2-2)
    Bw1600,
    /// 2000 MHz (FR2-2)
    Bw2000,
}

impl Bandwidth {
    /// Get bandwidth in MHz
    pub fn as_mhz(&self) -> u32 {
        match self {
            Bandwidth::Bw5 => 5,
            Bandwidth::Bw10 => 10,
            Bandwidth::Bw15 => 15,
            Bandwidth::Bw20 => 20,
            Bandwidth::Bw25 => 25,
            Bandwidth::Bw30 => 30,
            Bandwidth::Bw40 => 40,
            Bandwidth::Bw50 => 50,
            Bandwidth::Bw60 => 60,
            Bandwidth::Bw70 => 70,
            Bandwidth::Bw80 => 80,
            Bandwidth::Bw90 => 90,
            Bandwidth::Bw100 => 100,
            Bandwidth::Bw200 => 200,
            Bandwidth::Bw400 => 400,
            Bandwidth::Bw800 => 800,
            Bandwidth::Bw1600 => 1600,
            Bandwidth::Bw2000 => 2000,
        }
    }

    /// Get bandwidth in Hz
    pub fn as_hz(&self) -> u64 {
        self.as_mhz() as u64 * 1_000_000
    }
}

/// Modulation scheme for payload symbol generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulationScheme {
    /// Binary phase shift keying
    Bpsk,
    /// Quadrature phase shift keying
    Qpsk,
    /// 16-point quadrature amplitude modulation
    Qam16,
    /// 64-point quadrature amplitude modulation
    Qam64,
    /// 256-point quadrature amplitude modulation
    Qam256,
}

impl ModulationScheme {
    /// Number of bits carried per modulated symbol
    pub fn bits_per_symbol(&self) -> usize {
        match self {
            ModulationScheme::Bpsk => 1,
            ModulationScheme::Qpsk => 2,
            ModulationScheme::Qam16 => 4,
            ModulationScheme::Qam64 => 6,
            ModulationScheme::Qam256 => 8,
        }
    }
}
