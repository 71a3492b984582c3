use std::collections::{HashMap, HashSet};

use serde_json::json;
use u_timetable::prelude::*;

fn input(value: serde_json::Value) -> CatalogInput {
    serde_json::from_value(value).unwrap()
}

fn school() -> CatalogInput {
    input(json!({
        "middle_school": {
            "years": [
                {"year": 1, "sections": [
                    {"section": "1M1", "subjects": [
                        {"name": "Math", "coef": 5},
                        {"name": "Arabic", "coef": 4},
                        {"name": "Sport", "coef": 2}
                    ]},
                    {"section": "1M2", "subjects": [
                        {"name": "Math", "coef": 5},
                        {"name": "Arabic", "coef": 4},
                        {"name": "Sport", "coef": 2}
                    ]}
                ]},
                {"year": 2, "sections": [
                    {"section": "2M1", "subjects": [
                        {"name": "Math", "coef": 4},
                        {"name": "French", "coef": 3}
                    ]}
                ]}
            ]
        },
        "high_school": {
            "years": [
                {"year": 1, "sections": [
                    {"section": "1S1", "stream": "scientifique", "subjects": [
                        {"name": "Physics", "weeklyCount": 4},
                        {"name": "Math", "weeklyCount": 6},
                        {"name": "Sport", "weeklyCount": 1}
                    ]}
                ]}
            ]
        },
        "teachers": [
            {"name": "MS_Teacher_1", "subjects": ["Math"]},
            {"name": "MS_Teacher_2", "subjects": ["Math", "French"]},
            {"name": "MS_Teacher_3", "subjects": [{"name": "Arabic"}, {"name": "Sport"}]},
            {"name": "HS_Teacher_1", "qualifiedSubjects": ["Physics", "Math"]},
            {"name": "HS_Teacher_2", "qualifiedSubjects": ["sport "]}
        ],
        "rooms": [
            {"name": "MS_Room_1M1", "type": "general"},
            {"name": "MS_Room_1M2", "type": "general"},
            {"name": "MS_Room_2M1", "type": "general"},
            {"name": "HS_Room_1S1", "type": "general"}
        ]
    }))
}

fn coefficients(input: &CatalogInput) -> HashMap<(String, String), usize> {
    let mut out = HashMap::new();
    for (_, level) in input.levels() {
        for year in &level.years {
            for section in &year.sections {
                for subject in &section.subjects {
                    out.insert(
                        (section.section.clone(), subject.name.clone()),
                        subject.weekly_count as usize,
                    );
                }
            }
        }
    }
    out
}

fn slots_of(entry: &ScheduleEntry) -> Vec<String> {
    match entry.slot_label.split_once('-') {
        Some((a, b)) => vec![a.to_string(), b.to_string()],
        None => vec![entry.slot_label.clone()],
    }
}

#[test]
fn test_rows_match_coefficients() {
    let school = school();
    let result = Timetabler::new(EngineConfig::default())
        .run(&school, &ScopeSelector::All)
        .unwrap();

    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for e in result.report.entries() {
        *counts.entry((e.section.clone(), e.subject.clone())).or_insert(0) += 1;
    }
    assert_eq!(counts, coefficients(&school));
    assert!(result.is_complete());
    assert_eq!(result.violations().count(), 0);
}

#[test]
fn test_no_double_booking() {
    let result = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::All)
        .unwrap();

    let mut teacher_cells = HashSet::new();
    let mut section_cells = HashSet::new();
    for e in result.report.entries() {
        for slot in slots_of(e) {
            assert!(section_cells.insert((e.section.clone(), e.day.clone(), slot.clone())));
            if !e.is_sentinel() {
                assert!(
                    teacher_cells.insert((e.teacher.clone(), e.day.clone(), slot)),
                    "{} double booked",
                    e.teacher
                );
            }
        }
    }
}

#[test]
fn test_blocks_on_legal_pairs() {
    let result = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::All)
        .unwrap();

    let sport: Vec<&ScheduleEntry> = result.report.entries().filter(|e| e.subject == "Sport").collect();
    assert_eq!(sport.len(), 5);
    for e in sport {
        let expected_time = match e.slot_label.as_str() {
            "1-2" => "8:00 - 10:00",
            "3-4" => "10:00 - 12:00",
            "5-6" => "13:30 - 15:30",
            "7-8" => "15:30 - 17:30",
            other => panic!("illegal block {other}"),
        };
        assert_eq!(e.time, expected_time);
    }
}

#[test]
fn test_teachers_stay_in_their_level() {
    let result = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::All)
        .unwrap();

    for section in result.report.level(Level::Middle).unwrap().years.iter().flat_map(|y| &y.sections) {
        assert!(section.schedule.iter().all(|e| e.teacher.starts_with("MS_")));
        assert!(section.schedule.iter().all(|e| e.room == format!("MS_Room_{}", section.section)));
    }
    let s1 = result.report.section("1S1").unwrap();
    assert!(s1.schedule.iter().all(|e| e.teacher.starts_with("HS_")));
    assert!(s1.schedule.iter().all(|e| e.stream.as_deref() == Some("scientifique")));
}

#[test]
fn test_report_is_idempotent() {
    let config = EngineConfig::default().with_seed(5);
    let a = Timetabler::new(config.clone()).run(&school(), &ScopeSelector::All).unwrap();
    let b = Timetabler::new(config).run(&school(), &ScopeSelector::All).unwrap();
    assert_eq!(
        a.report.to_json_string().unwrap(),
        b.report.to_json_string().unwrap()
    );
}

#[test]
fn test_single_block_single_teacher() {
    let input = input(json!({
        "high_school": {"years": [{"year": 3, "sections": [
            {"section": "3S1", "subjects": [{"name": "Sport", "coef": 1}]}
        ]}]},
        "teachers": [{"name": "HS_Teacher_9", "subjects": ["Sport"]}],
        "rooms": [{"name": "HS_Room_3S1"}]
    }));
    let result = Timetabler::new(EngineConfig::default())
        .run(&input, &ScopeSelector::All)
        .unwrap();

    let rows: Vec<&ScheduleEntry> = result.report.entries().collect();
    assert_eq!(rows.len(), 1);
    assert!(["1-2", "3-4", "5-6", "7-8"].contains(&rows[0].slot_label.as_str()));
    assert_eq!(rows[0].teacher, "HS_Teacher_9");
    assert_eq!(result.outcomes[0].status, SearchStatus::Optimal);
}

#[test]
fn test_unqualified_subject_is_rejected() {
    let input = input(json!({
        "middle_school": {"years": [{"year": 1, "sections": [
            {"section": "1M1", "subjects": [{"name": "Latin", "coef": 2}]}
        ]}]},
        "teachers": [{"name": "MS_Teacher_1", "subjects": ["Math"]}],
        "rooms": [{"name": "MS_Room_1M1"}]
    }));
    let err = Timetabler::new(EngineConfig::default())
        .run(&input, &ScopeSelector::All)
        .unwrap_err();
    assert!(matches!(
        err,
        TimetableError::Configuration(ConfigurationError::UnqualifiedSubject { .. })
    ));
}

#[test]
fn test_shared_teacher_across_sections() {
    let input = input(json!({
        "middle_school": {"years": [{"year": 1, "sections": [
            {"section": "1M1", "subjects": [{"name": "Math", "coef": 1}]},
            {"section": "1M2", "subjects": [{"name": "Math", "coef": 1}]}
        ]}]},
        "teachers": [{"name": "MS_Teacher_1", "subjects": ["Math"]}],
        "rooms": [{"name": "MS_Room_1M1"}, {"name": "MS_Room_1M2"}]
    }));
    let result = Timetabler::new(EngineConfig::default())
        .run(&input, &ScopeSelector::All)
        .unwrap();

    assert_eq!(result.outcomes.len(), 1);
    let rows: Vec<&ScheduleEntry> = result.report.entries().collect();
    assert_eq!(rows.len(), 2);
    assert_ne!(
        (&rows[0].day, &rows[0].slot_label),
        (&rows[1].day, &rows[1].slot_label)
    );
    assert_eq!(result.sentinel_count(), 0);
}

#[test]
fn test_exhausted_budget_degrades_gracefully() {
    let input = input(json!({
        "middle_school": {"years": [{"year": 1, "sections": [
            {"section": "1M1", "subjects": [{"name": "Math", "coef": 25}]},
            {"section": "1M2", "subjects": [{"name": "Math", "coef": 25}]}
        ]}]},
        "teachers": [{"name": "MS_Teacher_1", "subjects": ["Math"]}],
        "rooms": [{"name": "MS_Room_1M1"}, {"name": "MS_Room_1M2"}]
    }));
    let config = EngineConfig::default().with_step_limit(1);
    let result = Timetabler::new(config).run(&input, &ScopeSelector::All).unwrap();

    assert_eq!(result.report.row_count(), 50);
    // One teacher covers at most 40 cells.
    assert!(result.report.sentinel_count() >= 10);
    assert_eq!(result.report.sentinel_count(), result.sentinel_count());
    assert!(!result.is_complete());
}

#[test]
fn test_greedy_strategy() {
    let config = EngineConfig::default().with_strategy(Strategy::Greedy).with_seed(9);
    let school = school();
    let result = Timetabler::new(config).run(&school, &ScopeSelector::All).unwrap();

    let expected: usize = coefficients(&school).values().sum();
    assert_eq!(result.report.row_count(), expected);
    assert_eq!(result.violations().count(), 0);
}

#[test]
fn test_section_selector() {
    let result = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::Sections(vec!["2M1".into()]))
        .unwrap();
    assert!(result.report.high_school.is_none());
    assert_eq!(result.report.row_count(), 7);

    let err = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::Sections(vec!["2M9".into()]))
        .unwrap_err();
    assert!(matches!(
        err,
        TimetableError::Configuration(ConfigurationError::UnknownSection(_))
    ));
}

#[test]
fn test_portfolio_and_joint_scope() {
    let config = EngineConfig::default().with_workers(3).with_joint_scope(true);
    let result = Timetabler::new(config).run(&school(), &ScopeSelector::All).unwrap();
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].sections.len(), 4);
    assert_eq!(result.report.row_count(), 40);
    assert_eq!(result.sentinel_count(), 0);
}

#[test]
fn test_config_from_toml() {
    let config = EngineConfig::from_toml_str(
        r#"
seed = 7
strategy = "greedy"
room_policy = "pooled"
block_subjects = ["sport", "lab"]

[grid]
days = ["dimanche", "lundi", "mardi"]
block_pairs = [[1, 2]]
slots = [
    { start = "8:00", end = "9:00" },
    { start = "9:00", end = "10:00" },
    { start = "10:00", end = "11:00" },
]
"#,
    )
    .unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.strategy, Strategy::Greedy);
    assert_eq!(config.room_policy, RoomPolicy::Pooled);
    assert_eq!(config.grid.days.len(), 3);
    assert_eq!(config.workers, 1);

    let input = input(json!({
        "middle_school": {"years": [{"year": 1, "sections": [
            {"section": "1M1", "subjects": [
                {"name": "Math", "coef": 3},
                {"name": "Sport", "coef": 1, "roomType": "gym"}
            ]}
        ]}]},
        "teachers": [{"name": "T1", "subjects": ["Math", "Sport"]}],
        "rooms": [{"name": "Room A"}, {"name": "Gym", "type": "gym"}]
    }));
    let result = Timetabler::new(config).run(&input, &ScopeSelector::All).unwrap();
    let sport = result.report.entries().find(|e| e.subject == "Sport").unwrap();
    assert_eq!(sport.slot_label, "1-2");
    assert_eq!(sport.room, "Gym");
    assert!(result
        .report
        .entries()
        .filter(|e| e.subject == "Math")
        .all(|e| e.room == "Room A"));
}

#[test]
fn test_zero_and_repeated_subjects() {
    let input = input(json!({
        "middle_school": {"years": [{"year": 1, "sections": [
            {"section": "1M1", "subjects": [
                {"name": "Math", "coef": 2},
                {"name": "Civil", "coef": 0},
                {"name": "math", "coef": 1}
            ]}
        ]}]},
        "teachers": [{"name": "MS_Teacher_1", "subjects": ["Math", "Civil"]}],
        "rooms": [{"name": "MS_Room_1M1"}]
    }));
    let result = Timetabler::new(EngineConfig::default())
        .run(&input, &ScopeSelector::All)
        .unwrap();

    let rows: Vec<&ScheduleEntry> = result.report.entries().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|e| e.subject == "Math"));
    assert_eq!(result.violations().count(), 0);
    assert!(result.is_complete());
}

#[test]
fn test_stream_key_always_present() {
    let result = Timetabler::new(EngineConfig::default())
        .run(&school(), &ScopeSelector::All)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.report.to_json_string().unwrap()).unwrap();

    let middle = &json["middle_school"]["years"][0]["sections"][0];
    assert!(middle.get("stream").is_some_and(|v| v.is_null()));
    for row in middle["schedule"].as_array().unwrap() {
        assert!(row.get("stream").is_some_and(|v| v.is_null()));
    }
    let high_row = &json["high_school"]["years"][0]["sections"][0]["schedule"][0];
    assert_eq!(high_row["stream"], "scientifique");
}
