use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sandbox_core::{ChoiceKey, ChoiceMap, P3Flags, QuickActions, Scenario, ToolId, ToolkitFlow};

fn build_scenario() -> Scenario {
    let actions = |k: &str| (1..=3).map(|i| format!("{k} action {i}")).collect::<Vec<_>>();
    Scenario {
        scenario_id: "BENCH-S1".into(),
        title: "Bench".into(),
        prompt: "Pick one".into(),
        choices: ChoiceMap {
            a: "Phased transition with an independent audit".into(),
            b: "Immediate pause of the rollout".into(),
            c: "Keep current arrangement".into(),
        },
        toolkit_cues: None,
        p3_cues: None,
        toolkit_flow: ToolkitFlow {
            order: vec![ToolId::T1, ToolId::T3, ToolId::T5],
            prompts: vec!["Who is affected?".into(), "What could go wrong?".into()],
            quick_actions: QuickActions::PerChoice(ChoiceMap {
                a: actions("A"),
                b: actions("B"),
                c: actions("C"),
            }),
            metrics: vec![],
            owner_required: Some(true),
            review_default_days: Some(90),
        },
        tags: vec![],
    }
}

fn bench_scoring(c: &mut Criterion) {
    let scenario = build_scenario();
    let fill = scoring::ToolkitFill {
        prompts_done: 2,
        total_prompts: 2,
        actions_done: 2,
        total_actions: 3,
    };
    let p3 = P3Flags::new(true, false, true, 2);
    c.bench_function("score_decision", |b| {
        b.iter(|| {
            black_box(scoring::score_decision(
                &scenario,
                ChoiceKey::A,
                &fill,
                &p3,
                black_box(420),
                0.5,
            ))
        })
    });
    c.bench_function("describe_result x3", |b| {
        b.iter(|| {
            for key in ChoiceKey::ALL {
                black_box(scoring::describe_result(&scenario, key));
            }
        })
    });
}

criterion_group!(benches, bench_scoring);
criterion_main!(benches);
