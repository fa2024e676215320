// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chrono::Duration` doesn't derive `Serialize`/`Deserialize` — store it as
//! milliseconds, the same unit the rest of the workspace already uses for
//! durations (e.g. `Clock::epoch_ms` in the teacher crate this one descends
//! from).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(duration: &chrono::Duration, serializer: S) -> Result<S::Ok, S::Error> {
    duration.num_milliseconds().serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<chrono::Duration, D::Error> {
    let ms = i64::deserialize(deserializer)?;
    Ok(chrono::Duration::milliseconds(ms))
}

#[cfg(test)]
mod tests {
    #[test]
    fn round_trips_through_json() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper(#[serde(with = "super")] chrono::Duration);

        let original = Wrapper(chrono::Duration::milliseconds(12345));
        let json = serde_json::to_string(&original).unwrap();
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.0, original.0);
    }
}
