//! Performance benchmarks for rating calculations

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tt_league::rating::{
    LeagueBatchUpdater, MatchProcessor, RatingCalculator, RatingChangeCalculator, RatingsSnapshot,
    TableVersion,
};
use tt_league::types::{Division, LeagueSession, MatchRow, PlayerRecord};

fn bench_rating_change(c: &mut Criterion) {
    let calculator = RatingChangeCalculator::default();
    let long_form = RatingChangeCalculator::new(TableVersion::LongForm);

    c.bench_function("rating_change_standard", |b| {
        b.iter(|| {
            for gap in (-400..=400).step_by(25) {
                for margin in [-3, -2, -1, 1, 2, 3] {
                    let _ = black_box(calculator.rating_change(black_box(gap as f64), margin));
                }
            }
        })
    });

    c.bench_function("rating_change_long_form", |b| {
        b.iter(|| {
            for gap in (-400..=400).step_by(25) {
                let _ = black_box(long_form.rating_change(black_box(gap as f64), 2));
            }
        })
    });
}

fn bench_match_processing(c: &mut Criterion) {
    let processor = MatchProcessor::<RatingChangeCalculator>::default();
    let row = MatchRow::from_scores(
        "alice",
        "bob",
        &[(11, 7), (9, 11), (11, 8), (6, 11), (12, 10)],
    );

    c.bench_function("process_five_game_match", |b| {
        b.iter(|| black_box(processor.process(black_box(&row), 1040.0, 1010.0)))
    });
}

/// A league night: `divisions` round robins of six players each
fn create_session(divisions: usize) -> (RatingsSnapshot, LeagueSession) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default();

    let mut players = Vec::new();
    let mut rows = Vec::new();
    let mut division_list = Vec::new();

    for d in 0..divisions {
        let names: Vec<String> = (0..6).map(|i| format!("player_{}_{}", d, i)).collect();
        for (i, name) in names.iter().enumerate() {
            let rating = 1400.0 - (d * 60) as f64 - (i * 10) as f64;
            players.push(PlayerRecord::new(name.clone(), rating, start));
        }
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                let scores: &[(u32, u32)] = if (i + j) % 3 == 0 {
                    &[(11, 9), (8, 11), (11, 4), (11, 13), (11, 6)]
                } else {
                    &[(11, 5), (11, 7), (11, 9)]
                };
                rows.push(MatchRow::from_scores(names[i].clone(), names[j].clone(), scores));
            }
        }
        division_list.push(Division {
            number: d + 1,
            players: names,
        });
    }

    let snapshot = RatingsSnapshot::new(players).unwrap_or_default();
    let session = LeagueSession {
        date,
        rows,
        divisions: division_list,
    };
    (snapshot, session)
}

fn bench_apply_session(c: &mut Criterion) {
    let updater = LeagueBatchUpdater::with_table(TableVersion::Standard);

    for divisions in [1usize, 8, 32] {
        let (snapshot, session) = create_session(divisions);
        c.bench_function(&format!("apply_session_{}_divisions", divisions), |b| {
            b.iter(|| black_box(updater.apply_session(black_box(&snapshot), black_box(&session))))
        });
    }
}

criterion_group!(
    benches,
    bench_rating_change,
    bench_match_processing,
    bench_apply_session
);
criterion_main!(benches);
