//! Regenerates the golden vectors checked into `vectors/`. Deterministic
//! except for the `rand`-seeded ALU fuzz batch, which is re-sampled each run
//! (that batch is exercised live by `tests/alu_fuzz_test.rs`, not replayed
//! from a checked-in file).

use riscv32_vectors::encode::{add, addi, bne, ebreak, image, lb, lui, lw, sb, slt, sltu};
use riscv32_vectors::Vector;
use std::fs;
use std::path::Path;

const RAM_BASE: u32 = 0x1000_0000;

fn regs(pairs: &[(u8, u32)]) -> [u32; 32] {
    let mut r = [0u32; 32];
    for &(idx, val) in pairs {
        r[idx as usize] = val;
    }
    r
}

fn write_vector(dir: &Path, vector: &Vector) {
    let path = dir.join(format!("{}.json", vector.name));
    let json = serde_json::to_string_pretty(vector).expect("vector serializes");
    fs::write(path, json).expect("vector file is writable");
}

fn main() {
    let dir = Path::new("vectors");
    fs::create_dir_all(dir).expect("vectors/ directory is creatable");

    // Scenario 1: LUI immediately visible, EBREAK halts without advancing PC.
    write_vector(
        dir,
        &Vector {
            name: "lui_then_ebreak".into(),
            rom: image(&[lui(10, 0x0000_1000), ebreak()]),
            max_ticks: 16,
            expected_regs: regs(&[(10, 0x0000_1000)]),
            expected_pc: 4,
            expect_halted: true,
            expected_instret: Some(2),
        },
    );

    // Scenario 2: register-register ADD over two ADDI-loaded operands.
    write_vector(
        dir,
        &Vector {
            name: "addi_add_chain".into(),
            rom: image(&[addi(10, 0, 22), addi(11, 0, 5), add(12, 10, 11), ebreak()]),
            max_ticks: 32,
            expected_regs: regs(&[(10, 22), (11, 5), (12, 27)]),
            expected_pc: 12,
            expect_halted: true,
            expected_instret: Some(4),
        },
    );

    // Scenario 3: SLT/SLTU diverge on a negative left operand.
    write_vector(
        dir,
        &Vector {
            name: "slt_sltu_signed_vs_unsigned".into(),
            rom: image(&[
                addi(10, 0, -5),
                addi(11, 0, 5),
                slt(12, 10, 11),
                sltu(13, 10, 11),
                ebreak(),
            ]),
            max_ticks: 32,
            expected_regs: regs(&[(10, (-5i32) as u32), (11, 5), (12, 1), (13, 0)]),
            expected_pc: 16,
            expect_halted: true,
            expected_instret: Some(5),
        },
    );

    // Scenario 4: BNE-driven countdown loop; instret counts every retired
    // fetch including the three taken branches and the final EBREAK.
    write_vector(
        dir,
        &Vector {
            name: "countdown_loop_bne".into(),
            rom: image(&[addi(10, 0, 3), addi(10, 10, -1), bne(10, 0, -4), ebreak()]),
            max_ticks: 64,
            expected_regs: regs(&[(10, 0)]),
            expected_pc: 12,
            expect_halted: true,
            expected_instret: Some(8),
        },
    );

    // Scenario 5: LB sign-extension across all four byte lanes of one word.
    {
        let prog = [addi(1, 0, 0x100), lb(10, 1, 0), lb(11, 1, 1), lb(12, 1, 2), lb(13, 1, 3), ebreak()];
        let mut rom = image(&prog);
        rom.resize(0x100, 0);
        rom.extend_from_slice(&[0x12, 0x34, 0xD6, 0xF8]);
        write_vector(
            dir,
            &Vector {
                name: "load_byte_sign_extension_boundaries".into(),
                rom,
                max_ticks: 64,
                expected_regs: regs(&[
                    (1, 0x100),
                    (10, 0x0000_0012),
                    (11, 0x0000_0034),
                    (12, 0xFFFF_FFD6),
                    (13, 0xFFFF_FFF8),
                ]),
                expected_pc: 20,
                expect_halted: true,
                expected_instret: Some(6),
            },
        );
    }

    // Scenario 6: SB into a middle byte lane, then LW reads the whole word
    // back with the other three lanes untouched (RAM is freshly zeroed).
    write_vector(
        dir,
        &Vector {
            name: "store_byte_then_load_word_preserves_lanes".into(),
            rom: image(&[lui(1, RAM_BASE as i32), addi(2, 0, 0x78), sb(1, 2, 2), lw(10, 1, 0), ebreak()]),
            max_ticks: 64,
            expected_regs: regs(&[(1, RAM_BASE), (2, 0x78), (10, 0x0078_0000)]),
            expected_pc: 16,
            expect_halted: true,
            expected_instret: Some(5),
        },
    );

    eprintln!("wrote 6 golden vectors to {}", dir.display());
}
