//! Recovery phrase dictionary.
//!
//! Deliberately not BIP39 (licensing, and this isn't a cryptocurrency
//! wallet seed) — a plain, short, unambiguous word list is enough entropy
//! for a recovery phrase that only needs to beat online guessing of a
//! username reclaim, not offline brute force of a private key.

pub const WORDLIST: &[&str] = &[
    "anchor", "anvil", "apple", "arbor", "arrow", "ash", "aspen", "atlas",
    "badge", "banjo", "barn", "basil", "beacon", "beaver", "bell", "berry",
    "birch", "bison", "blanket", "blaze", "bloom", "blue", "boat", "bolt",
    "bone", "boot", "branch", "brass", "bread", "brick", "bridge", "brook",
    "brush", "bucket", "buffalo", "cabin", "cactus", "camp", "canoe", "canyon",
    "cargo", "cedar", "chalk", "charm", "cherry", "chess", "chisel", "cider",
    "cinder", "clamp", "clay", "cliff", "cloak", "clover", "coal", "coast",
    "cobalt", "comet", "compass", "copper", "coral", "cove", "crane", "crater",
    "creek", "crest", "cricket", "crown", "crystal", "current", "dagger", "daisy",
    "dawn", "deck", "delta", "desert", "dew", "diamond", "dove", "dune",
    "dusk", "eagle", "echo", "elder", "elm", "ember", "falcon", "feather",
    "fern", "field", "finch", "fir", "flame", "flint", "fog", "forest",
    "forge", "fox", "frost", "gable", "garnet", "gate", "glacier", "glade",
    "gorge", "granite", "grape", "gravel", "grove", "gull", "hammer", "harbor",
    "harp", "hawk", "hazel", "hearth", "hemlock", "heron", "hickory", "hill",
    "hive", "holly", "hoof", "horizon", "hull", "hut", "ibis", "ice",
    "iris", "ivory", "ivy", "jade", "jasper", "juniper", "kayak", "kelp",
    "kestrel", "kettle", "kiln", "kite", "lagoon", "lake", "lantern", "larch",
    "latch", "laurel", "ledge", "lichen", "lily", "linen", "loam", "lodge",
    "loom", "lotus", "lumber", "lynx", "maple", "marble", "marsh", "meadow",
    "mesa", "millet", "mint", "mist", "moor", "moss", "nectar", "nest",
    "nettle", "nickel", "north", "nugget", "oak", "oasis", "oat", "ocean",
    "onyx", "opal", "orbit", "orchard", "osprey", "otter", "owl", "paddle",
    "palm", "pebble", "pelican", "perch", "petal", "pewter", "pier", "pine",
    "pioneer", "plank", "plateau", "plum", "pond", "poplar", "prairie", "quarry",
    "quartz", "quill", "quiver", "raft", "rapid", "raven", "reed", "reef",
    "ridge", "river", "robin", "rock", "root", "rowan", "rudder", "rust",
    "saddle", "sage", "sail", "sand", "sap", "sapling", "saw", "scout",
    "shale", "shell", "shore", "silo", "sky", "slate", "sloop", "sorrel",
    "spark", "sparrow", "spruce", "stable", "stone", "stork", "stream", "summit",
    "swallow", "swamp", "tern", "thatch", "thicket", "thistle", "thorn", "thrush",
    "tide", "timber", "torch", "trail", "trout", "tundra", "valley", "vine",
    "violet", "wagon", "walnut", "warble", "wharf", "wicker", "willow", "wren",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordlist_has_no_duplicates() {
        let mut sorted = WORDLIST.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), WORDLIST.len());
    }

    #[test]
    fn wordlist_has_enough_entropy_for_recovery_phrases() {
        assert!(WORDLIST.len() >= 200);
    }
}
