use proptest::prelude::*;
use crate::Mode;


pub(crate) fn mode_strategy(max_n: u16) -> impl Strategy<Value = Mode> {
    (1u16..max_n.max(2), 0u8..4).prop_map(|(n, mode_type)| {
        match mode_type {
            0 => Mode::kh(n),
            1 => Mode::kl(n),
            2 => Mode::dh(n),
            _ => Mode::dl(n),
        }
    })
}

/// Well formed codes with values every factory accepts: `3d6`, `d20`, `4dF`...
pub(crate) fn die_code_strategy() -> impl Strategy<Value = String> {
    let quantity = prop::option::of(1u16..=20);
    let faces = prop_oneof![
        (2u16..=100).prop_map(|sides| sides.to_string()),
        prop_oneof![Just("F".to_string()), Just("f".to_string())]
    ];

    (quantity, prop_oneof![Just("d"), Just("D")], faces)
        .prop_map(|(quantity, d, faces)| match quantity {
            Some(quantity) => format!("{quantity}{d}{faces}"),
            None => format!("{d}{faces}")
        })
}
