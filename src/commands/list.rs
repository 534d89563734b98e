//! List command implementation

use spimux_core::Variant;

/// List all supported controller variants with their chip-select routes
pub fn list_variants() {
    println!("Supported controllers:");

    for variant in Variant::ALL {
        let profile = variant.profile();
        println!();
        println!(
            "  {:<8} {} (peripheral id {})",
            variant.name(),
            profile.name,
            profile.peripheral_id
        );
        println!(
            "           MISO {}  MOSI {}  SPCK {}",
            profile.miso, profile.mosi, profile.spck
        );

        println!("           {:<8} {:<6} {}", "Channel", "Pin", "Function");
        for route in profile.cs_routes {
            println!(
                "           NPCS{:<4} {:<6} {:?}",
                route.channel.to_string(),
                route.pin.to_string(),
                route.function
            );
        }
    }
}
