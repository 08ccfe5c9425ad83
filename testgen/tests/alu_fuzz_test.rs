//! Bounded property test: no external RV32I oracle exists for a from-scratch
//! core, so the ALU is checked against an independent i64/u64-widened
//! reference implementation instead of cross-validated against a second
//! emulator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riscv32_core::alu::{Alu, AluOp};

const ITERATIONS: usize = 2000;
const SEED: u64 = 0x5EED_1234_5678_9ABC;

fn reference(op: AluOp, in1: u32, in2: u32, shamt: u32) -> u32 {
    let shamt = shamt & 0x1f;
    match op {
        AluOp::Add => ((in1 as i64 + in2 as i64) & 0xffff_ffff) as u32,
        AluOp::Sub => ((in1 as i64 - in2 as i64) & 0xffff_ffff) as u32,
        AluOp::ShiftLl => (((in1 as u64) << shamt) & 0xffff_ffff) as u32,
        AluOp::ShiftRl => (in1 as u64 >> shamt) as u32,
        AluOp::ShiftRa => ((in1 as i32 as i64) >> shamt) as u32,
        AluOp::Lt => u32::from((in1 as i32 as i64) < (in2 as i32 as i64)),
        AluOp::Ltu => u32::from((in1 as u64) < (in2 as u64)),
        AluOp::Eq => u32::from(in1 == in2),
        AluOp::Xor => in1 ^ in2,
        AluOp::Or => in1 | in2,
        AluOp::And => in1 & in2,
    }
}

const OPS: [AluOp; 11] = [
    AluOp::Add,
    AluOp::Sub,
    AluOp::ShiftLl,
    AluOp::ShiftRl,
    AluOp::ShiftRa,
    AluOp::Lt,
    AluOp::Ltu,
    AluOp::Eq,
    AluOp::Xor,
    AluOp::Or,
    AluOp::And,
];

#[test]
fn alu_matches_widened_arithmetic_reference() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for _ in 0..ITERATIONS {
        for op in OPS {
            let in1: u32 = rng.r#gen();
            let in2: u32 = rng.r#gen();
            let shamt: u32 = rng.r#gen();
            let expected = reference(op, in1, in2, shamt);
            let actual = Alu::eval(op, in1, in2, shamt);
            assert_eq!(
                actual, expected,
                "{op:?}(in1={in1:#010x}, in2={in2:#010x}, shamt={shamt}) = {actual:#010x}, expected {expected:#010x}"
            );
        }
    }
}
