use chip::{chip8::ChipSet, opcode::Instruction, resources::Rom, Config};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ROM_NAME: &str = "BENCH";

/// counts V0 up, draws the glyph of its low nibble and jumps back
const PROGRAM: [u16; 6] = [0x7001, 0xF029, 0x6100, 0x00E0, 0xD115, 0x1200];

static BASE_ROM: once_cell::sync::Lazy<Rom> = once_cell::sync::Lazy::new(|| {
    let data: Vec<u8> = PROGRAM.iter().flat_map(|op| op.to_be_bytes()).collect();
    Rom::new(ROM_NAME, data)
});

/// will setup the default configured chip
fn get_default_chip() -> ChipSet {
    ChipSet::with_rom(&Config::default(), &BASE_ROM)
        .expect("The benchmark rom fits into memory.")
}

pub fn decode_bench(c: &mut Criterion) {
    c.bench_function("decode_bench", |b| {
        b.iter(|| {
            for opcode in (0..=u16::MAX).step_by(7) {
                black_box(Instruction::from(black_box(opcode)));
            }
        });
    });
}

pub fn next_bench(c: &mut Criterion) {
    let mut chip = get_default_chip();
    c.bench_function("next_bench", |b| {
        b.iter(|| {
            for _ in 0..PROGRAM.len() {
                black_box(chip.next().expect("The benchmark program never fails."));
            }
        });
    });
}

pub fn print_bench(c: &mut Criterion) {
    let chip = get_default_chip();
    c.bench_function("print_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", chip);
        });
    });
}

criterion_group!(benches, decode_bench, next_bench, print_bench);
criterion_main!(benches);
