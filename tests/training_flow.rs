//! 通过 API 网关完整跑一遍培训：登录 -> 选择领域 -> 前测 -> 学习 -> 后测 -> 结果

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use ehs_learn::shared::{AssessmentKind, Domain};
use ehs_learn::{
    ApiResult, ClientConfig, Destination, GuardDecision, HttpClient, HttpRequest, HttpResponse,
    LearnApi, MemoryStore, ModuleEvent, Phase, RouteAccess, Session, Step, TokenStore,
    TrainingFlow, guard,
};
use serde_json::json;

#[derive(Default)]
struct ScriptedHttp {
    routes: RefCell<HashMap<String, (u16, String)>>,
    log: RefCell<Vec<(String, Option<String>)>>,
}

impl ScriptedHttp {
    fn route(&self, url: &str, status: u16, body: serde_json::Value) {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    fn body_sent_to(&self, url: &str) -> Option<serde_json::Value> {
        self.log
            .borrow()
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .and_then(|(_, body)| body.as_deref())
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

#[async_trait(?Send)]
impl HttpClient for ScriptedHttp {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        self.log.borrow_mut().push((req.url.clone(), req.body.clone()));
        let reply = self.routes.borrow().get(&req.url).cloned();
        Ok(match reply {
            Some((status, body)) => HttpResponse::new(status, body),
            None => HttpResponse::new(404, "{}"),
        })
    }
}

fn question(text: &str, right: &str, wrong: &str) -> serde_json::Value {
    json!({
        "text": text,
        "options": [
            { "text": right, "isCorrect": true },
            { "text": wrong, "isCorrect": false }
        ]
    })
}

fn scripted_backend() -> ScriptedHttp {
    let http = ScriptedHttp::default();
    http.route(
        "/api/auth/login",
        200,
        json!({
            "token": "jwt-1",
            "refreshToken": "r-1",
            "user": { "id": "u-7", "name": "Lee", "email": "lee@example.com", "role": "learner" }
        }),
    );
    http.route(
        "/api/users/me/domain",
        200,
        json!({
            "id": "u-7", "name": "Lee", "email": "lee@example.com",
            "domain": { "id": "fire", "name": "Fire Safety" }
        }),
    );
    http.route(
        "/api/trainings/t-1",
        200,
        json!({
            "id": "t-1",
            "title": "Extinguisher Basics",
            "preAssessment": { "questions": [
                question("PASS stands for?", "Pull Aim Squeeze Sweep", "Push And Stop Safely"),
                question("Class A fires involve?", "Ordinary combustibles", "Metals"),
                question("First action on alarm?", "Evacuate", "Finish work"),
                question("Water on grease fire?", "Never", "Always"),
                question("Extinguisher check interval?", "Monthly", "Never")
            ]},
            "learningModule": {
                "id": "m-1",
                "contentType": "presentation",
                "url": "/files/extinguishers.pdf",
                "title": "Extinguishers",
                "pageCount": 3
            },
            "postAssessment": { "questions": [
                question("PASS stands for?", "Pull Aim Squeeze Sweep", "Push And Stop Safely"),
                question("Class A fires involve?", "Ordinary combustibles", "Metals"),
                question("First action on alarm?", "Evacuate", "Finish work"),
                question("Water on grease fire?", "Never", "Always")
            ]}
        }),
    );
    http.route("/api/assessments/t-1/pre", 200, json!({ "success": true }));
    http.route("/api/assessments/t-1/post", 200, json!({ "success": true }));
    http.route("/api/materials/m-1/progress", 200, json!({ "success": true }));
    http
}

/// 依次作答：true 选正确项，false 选错误项，None 跳过
fn run_assessment(flow: &mut TrainingFlow, plan: &[Option<bool>]) -> ehs_learn::shared::AssessmentResult {
    let engine = flow.engine_mut().expect("assessment phase has an engine");
    for choice in plan {
        if let Some(correct) = choice {
            engine.select_answer(if *correct { 0 } else { 1 }).unwrap();
        }
        if let Step::Submitted(result) = engine.next().unwrap() {
            return result;
        }
    }
    panic!("plan shorter than the question list");
}

#[tokio::test]
async fn full_training_run() {
    let api = LearnApi::new(
        scripted_backend(),
        TokenStore::new(MemoryStore::new()),
        ClientConfig::default(),
    );

    // 登录后没有领域，只能去领域选择页
    let mut session = Session::login(&api, "lee@example.com", "pw").await.unwrap();
    assert_eq!(
        guard(RouteAccess::LearnerArea, &session),
        GuardDecision::Redirect(Destination::DomainSelection)
    );

    session
        .select_domain(
            &api,
            Domain {
                id: "fire".into(),
                name: "Fire Safety".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(guard(RouteAccess::LearnerArea, &session), GuardDecision::Allow);
    assert_eq!(
        api.client().http().body_sent_to("/api/users/me/domain"),
        Some(json!({ "domainId": "fire" }))
    );

    let mut flow = TrainingFlow::new("t-1");
    flow.enter(&api).await.unwrap();
    assert_eq!(flow.phase(), Phase::PreAssessment);

    let pre = run_assessment(
        &mut flow,
        &[Some(true), Some(false), Some(true), None, Some(true)],
    );
    assert_eq!(pre.score, 60);
    api.submit_assessment("t-1", AssessmentKind::Pre, &pre)
        .await
        .unwrap();
    flow.on_pre_assessment_complete(pre).unwrap();

    // 翻到最后一页才算完成
    for index in 0..3 {
        if let Some(percent) = flow
            .apply_module_event(ModuleEvent::PageViewed { index })
            .unwrap()
        {
            api.report_progress("m-1", percent).await.unwrap();
        }
    }
    assert_eq!(
        api.client().http().body_sent_to("/api/materials/m-1/progress"),
        Some(json!({ "progress": 100 }))
    );
    flow.on_module_learning_complete().unwrap();

    let post = run_assessment(&mut flow, &[Some(true), Some(true), Some(true), None]);
    assert_eq!(post.score, 75);
    api.submit_assessment("t-1", AssessmentKind::Post, &post)
        .await
        .unwrap();
    flow.on_post_assessment_complete(post).unwrap();

    assert_eq!(flow.phase(), Phase::Results);
    let outcome = flow.finish().unwrap();
    assert_eq!(outcome.improvement.to_string(), "+15");
    assert_eq!(outcome.post_assessment_result.incorrect_count, 1);

    let submitted = api
        .client()
        .http()
        .body_sent_to("/api/assessments/t-1/post")
        .unwrap();
    assert_eq!(submitted["correctCount"], 3);
    assert_eq!(submitted["perQuestion"][3]["userAnswerText"], serde_json::Value::Null);
}

#[tokio::test]
async fn missing_training_stays_loading() {
    let api = LearnApi::new(
        scripted_backend(),
        TokenStore::new(MemoryStore::new()),
        ClientConfig::default(),
    );
    Session::login(&api, "lee@example.com", "pw").await.unwrap();

    let mut flow = TrainingFlow::new("t-unknown");
    assert!(flow.enter(&api).await.is_err());
    assert_eq!(flow.phase(), Phase::Loading);
}
