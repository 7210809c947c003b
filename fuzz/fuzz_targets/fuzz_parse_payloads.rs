#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Vehicle API bodies are JSON text; skip inputs that are not UTF-8
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    let _ = plugwatch::vehicle::tesla::parse_vehicle_list(body);
    let _ = plugwatch::vehicle::tesla::parse_drive_state(body);
    if let Ok(charge) = plugwatch::vehicle::tesla::parse_charge_state(body) {
        assert!(charge.battery_level_percent <= 100);
    }
});
