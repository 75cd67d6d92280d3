use tabtrack_config::{SOURCE_ID_GROUPS, SOURCE_ID_GROUP_LEN};
use uuid::Uuid;

/// Random per-load source identifier, e.g. `k3f0-9a1v-...`.
///
/// Not a durable identity: a fresh one is drawn every time a session starts.
pub fn generate_source_id() -> String {
    let needed = SOURCE_ID_GROUPS * SOURCE_ID_GROUP_LEN;
    let mut random = Vec::with_capacity(needed + 16);
    while random.len() < needed {
        // Bytes 6 and 8 carry the v4 version and variant bits.
        let id = Uuid::new_v4();
        random.extend(
            id.as_bytes()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != 6 && *i != 8)
                .map(|(_, b)| *b),
        );
    }

    random
        .chunks(SOURCE_ID_GROUP_LEN)
        .take(SOURCE_ID_GROUPS)
        .map(|group| {
            group
                .iter()
                .filter_map(|b| char::from_digit(u32::from(b % 32), 32))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}
