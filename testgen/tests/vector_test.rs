//! Replays the checked-in golden vectors (spec.md §8) against a freshly
//! assembled [`riscv32_vectors::run_vector`]. Each file is `include_str!`-ed
//! at compile time so this test never touches the filesystem at runtime.

use riscv32_vectors::Vector;

macro_rules! vector_test {
    ($test_name:ident, $file:literal) => {
        #[test]
        fn $test_name() {
            let json = include_str!(concat!("../vectors/", $file));
            let vector: Vector = serde_json::from_str(json).expect("fixture is valid JSON");
            vector.check();
        }
    };
}

vector_test!(lui_then_ebreak, "lui_then_ebreak.json");
vector_test!(addi_add_chain, "addi_add_chain.json");
vector_test!(slt_sltu_signed_vs_unsigned, "slt_sltu_signed_vs_unsigned.json");
vector_test!(countdown_loop_bne, "countdown_loop_bne.json");
vector_test!(load_byte_sign_extension_boundaries, "load_byte_sign_extension_boundaries.json");
vector_test!(store_byte_then_load_word_preserves_lanes, "store_byte_then_load_word_preserves_lanes.json");
