use std::env;

use famicore_core::Nes;

fn main() -> anyhow::Result<()> {
    let rom = env::args().nth(1).expect("usage: vblank_probe <rom> [frames]");
    let frames: u64 = env::args()
        .nth(2)
        .map(|s| s.parse().unwrap_or(10))
        .unwrap_or(10);

    let mut nes = Nes::new(&rom)?;
    nes.reset();

    let mut nmis = 0u64;
    let mut first_nmi_cycle = None;
    while nes.ppu().frame_count() < frames {
        let outcome = nes.step()?;
        if outcome.serviced_nmi {
            nmis += 1;
            first_nmi_cycle.get_or_insert(nes.cpu_cycles());
        }
    }

    println!("After {frames} frame(s):");
    println!("  CPU cycles: {}", nes.cpu_cycles());
    println!("  NMIs serviced: {nmis}");
    match first_nmi_cycle {
        Some(cycle) => println!("  first NMI at CPU cycle {cycle}"),
        None => println!("  no NMIs (PPUCTRL bit 7 never set?)"),
    }
    println!("  PPU position: ({}, {})", nes.ppu().scanline(), nes.ppu().cycle());

    Ok(())
}
