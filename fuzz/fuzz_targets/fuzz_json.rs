#![no_main]

use libfuzzer_sys::fuzz_target;

use efiscen_export::analysis::{Aggregator, Metric};
use efiscen_export::io::read_json_from_bytes;
use efiscen_export::models::Selection;

fuzz_target!(|data: &[u8]| {
    if let Ok(experiment) = read_json_from_bytes(data, "fuzz") {
        let selection = Selection::all();
        let agg = Aggregator::new(&experiment, &selection);
        for metric in Metric::ALL {
            let _ = agg.latest(metric);
            let _ = agg.series(metric).count();
        }
    }
});
