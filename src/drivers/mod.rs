//! Input drivers and peripheral bring-up.
//!
//! Pure decoding logic lives here (button gestures, rotary quadrature);
//! the ESP-IDF register work is confined to [`hw_init`].

pub mod button;
pub mod hw_init;
pub mod rotary;
