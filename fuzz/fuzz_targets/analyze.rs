#![no_main]
use chousei_libs::{analyze, slot, Event};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|event: Event| {
    #[cfg(feature = "log")]
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let analysis = analyze(&event);
    let aggregation = &analysis.aggregation;

    assert_eq!(aggregation.all_results.len(), event.slot_count());
    assert!(aggregation.valid_dates.iter().all(|tally| tally.meets_criteria));
    assert_eq!(
        aggregation.valid_dates.len(),
        aggregation.all_results.iter().filter(|t| t.meets_criteria).count()
    );

    for tally in &aggregation.all_results {
        assert_eq!(slot::decode(&tally.key).ok(), Some((tally.date, tally.slot)));
        assert!(tally.available_students <= tally.total_target_students);
        assert!(tally.available_teachers <= aggregation.teacher_count);
        assert!((0.0..=1.0).contains(&tally.student_ratio));
        if aggregation.student_count == 0 {
            assert!(!tally.meets_criteria, "no students, yet {} qualifies", tally.key);
        }
    }

    match (
        &analysis.recommendation.most_participants,
        &analysis.recommendation.earliest,
    ) {
        (Some(best), Some(first)) => {
            assert!(aggregation
                .valid_dates
                .iter()
                .all(|t| t.total_available <= best.total_available));
            assert!(aggregation
                .valid_dates
                .iter()
                .all(|t| t.starts_at() >= first.starts_at()));
        }
        (None, None) => assert!(aggregation.valid_dates.is_empty()),
        picks => panic!("only one pick present: {:?}", picks),
    }

    assert_eq!(analyze(&event), analysis);
});
