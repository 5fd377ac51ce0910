mod common;

use std::path::PathBuf;

use applybot_common::{ApplicantProfile, ApplyError, Documents, SiteSelectors};
use applybot_core::{DelaySimulator, FieldResolver, FormFiller, FormState};
use applybot_drivers::fake::{Action, FakeBrowser, FakeField, FakePosting, FakeStep};
use applybot_drivers::{BrowserDriver, Page};

/// Launch, load the board and open the first posting's form.
async fn open_form(browser: &FakeBrowser) -> Box<dyn Page> {
    common::init_test_tracing();
    let site = SiteSelectors::default();
    let session = browser.launch(None).await.unwrap();
    let page = session.new_page().await.unwrap();
    page.navigate(&site.search_url).await.unwrap();
    browser.open_posting(0);
    let apply = page.find_one(&site.apply_button).await.unwrap().unwrap();
    apply.click().await.unwrap();
    page
}

fn board(posting: FakePosting) -> FakeBrowser {
    FakeBrowser::new(vec![vec![posting]])
}

#[tokio::test(start_paused = true)]
async fn continue_leads_to_a_fresh_pending_step() {
    let browser = board(FakePosting::new("Engineer", "Globex").with_steps(vec![
        FakeStep::new(vec![FakeField::text("firstName")]),
        FakeStep::new(vec![FakeField::text("lastName")]),
    ]));
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let (profile, docs) = (common::profile(), common::documents());
    let mut filler = FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    );

    assert_eq!(filler.state(), FormState::StepPending);
    assert_eq!(filler.advance().await.unwrap(), FormState::StepFilled);
    // a continue control and no submit control
    assert_eq!(filler.advance().await.unwrap(), FormState::StepPending);
    assert_eq!(filler.steps_advanced(), 1);

    // the new step shows different controls
    assert_eq!(filler.advance().await.unwrap(), FormState::StepFilled);
    assert_eq!(filler.advance().await.unwrap(), FormState::AwaitingSubmit);
    assert_eq!(filler.advance().await.unwrap(), FormState::Completed);
    assert_eq!(filler.advance().await.unwrap(), FormState::Completed);

    let app = &browser.submitted()[0];
    assert_eq!(app.field("firstName").unwrap().value, "Jane");
    assert_eq!(app.field("lastName").unwrap().value, "Doe");
}

#[tokio::test(start_paused = true)]
async fn submit_only_step_completes_after_one_activation() {
    let browser = board(FakePosting::new("Engineer", "Globex"));
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let (profile, docs) = (common::profile(), common::documents());
    let mut filler = FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    );

    filler.run().await.unwrap();
    assert_eq!(filler.state(), FormState::Completed);
    assert_eq!(filler.steps_advanced(), 0);
    assert_eq!(browser.count(&Action::Click("submit".into())), 1);
}

#[tokio::test(start_paused = true)]
async fn dispatches_values_by_control_type() {
    let browser = board(FakePosting::new("Engineer", "Globex").with_steps(vec![FakeStep::new(
        vec![
            FakeField::tel("phone").with_id("phone"),
            FakeField::text("unused").with_placeholder("Location"),
            FakeField::textarea("email"),
            FakeField::select("country", &["DE", "US"]),
            FakeField::checkbox("relocate"),
            FakeField::checkbox("newsletter"),
            FakeField::text("salary"),
            FakeField::file("coverLetter"),
            FakeField::file("Resume_Upload"),
        ],
    )]));
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let mut profile = common::profile();
    profile.answers.insert(
        "newsletter".into(),
        applybot_common::FieldValue::Text("true".into()),
    );
    let docs = common::documents();
    let mut filler = FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    );
    filler.run().await.unwrap();

    let app = &browser.submitted()[0];
    assert_eq!(app.field("phone").unwrap().value, "555-0100");
    assert_eq!(app.field("Location").unwrap().value, "Berlin");
    assert_eq!(app.field("email").unwrap().value, "jane@example.com");
    assert_eq!(app.field("country").unwrap().selected.as_deref(), Some("DE"));
    assert!(app.field("relocate").unwrap().checked);
    // only a literal boolean activates a checkbox
    assert!(!app.field("newsletter").unwrap().checked);
    assert_eq!(app.field("salary").unwrap().value, "");
    assert_eq!(app.field("coverLetter").unwrap().uploaded, None);
    assert_eq!(
        app.field("Resume_Upload").unwrap().uploaded,
        Some(PathBuf::from("/docs/cv.pdf"))
    );
}

#[tokio::test(start_paused = true)]
async fn single_token_name_leaves_last_name_untouched() {
    let browser = board(FakePosting::new("Engineer", "Globex").with_steps(vec![FakeStep::new(
        vec![FakeField::text("firstname"), FakeField::text("lastname")],
    )]));
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let profile = ApplicantProfile {
        full_name: "Madonna".into(),
        ..ApplicantProfile::default()
    };
    let docs = Documents::default();
    FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    )
    .run()
    .await
    .unwrap();

    let app = &browser.submitted()[0];
    assert_eq!(app.field("firstname").unwrap().value, "Madonna");
    assert_eq!(app.field("lastname").unwrap().value, "");
    assert!(!browser
        .journal()
        .contains(&Action::Clear("lastname".into())));
}

#[tokio::test(start_paused = true)]
async fn step_without_controls_aborts_as_element_not_found() {
    let browser = board(FakePosting::new("Engineer", "Globex").without_form_controls());
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let (profile, docs) = (common::profile(), common::documents());
    let mut filler = FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    );

    let err = filler.run().await.unwrap_err();
    assert!(matches!(&err, ApplyError::Application(m) if m.contains("element not found")));
    assert_eq!(filler.state(), FormState::Aborted);
    assert!(browser.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn endless_forms_hit_the_step_cap() {
    let steps = (0..5).map(|_| FakeStep::default()).collect();
    let browser = board(FakePosting::new("Engineer", "Globex").with_steps(steps));
    let page = open_form(&browser).await;
    let site = SiteSelectors::default();
    let (profile, docs) = (common::profile(), common::documents());
    let mut filler = FormFiller::new(
        page.as_ref(),
        &site,
        FieldResolver::new(&profile, &docs),
        DelaySimulator::default(),
    )
    .with_max_steps(2);

    let err = filler.run().await.unwrap_err();
    assert!(err.to_string().contains("within 2 steps"));
    assert_eq!(filler.steps_advanced(), 2);
    assert_eq!(filler.state(), FormState::Aborted);
}
