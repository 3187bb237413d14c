//! Transfer Authorization
//!
//! Gate in front of submission: biometrics first, a 6-digit PIN as the
//! fallback.
//!
//! # State Machine
//!
//! ```text
//! NOT_STARTED → BIOMETRIC_PROMPTED → AUTHENTICATED
//!                     │
//!                     ├──▶ BIOMETRIC_UNAVAILABLE ──▶ PIN_PROMPTED ──▶ AUTHENTICATED
//!                     │                                  ▲   │
//!                     └──▶ BIOMETRIC_FAILED ─────────────┘   └──▶ REJECTED (cancel)
//!                              │  ▲
//!                              └──┘ retry
//! ```
//!
//! A wrong PIN clears the entry and stays in PIN_PROMPTED. There is no
//! attempt limit.

pub mod biometric;
pub mod gate;
pub mod pin;

pub use biometric::{BiometricDevice, BiometricError, BiometricResult, SimulatedBiometrics};
pub use gate::{AuthGate, AuthState, PinOutcome};
pub use pin::{InvalidPin, PIN_LENGTH, PinCode, PinEntry};
