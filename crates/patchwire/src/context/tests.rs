//! Unit tests for the request context and its verbs.

use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::datetime;

use super::*;
use crate::body::parse_items;
use crate::target::Swap;

#[fixture]
fn ctx() -> Context {
    Context::new(App::new(), "s-1")
}

fn increment() -> Callable {
    Callable::new("counter.increment", |_ctx| Ok("1".to_owned()))
}

#[rstest]
fn call_compiles_to_an_attribute_ready_invocation(ctx: Context) {
    let target = Target::new();
    let invocation = ctx
        .call(&increment(), Values::new().set("id", "c1"))
        .expect("register")
        .render(&target);

    let expected = format!(
        "__pw_call(event,&quot;inline&quot;,&quot;{}&quot;,&quot;/counter-increment&quot;,\
         [{{&quot;name&quot;:&quot;id&quot;,&quot;type&quot;:&quot;string&quot;,&quot;value&quot;:&quot;c1&quot;}}])",
        target.id()
    );
    assert_eq!(invocation, expected);
}

#[rstest]
#[case::render(Swap::Inline)]
#[case::replace(Swap::Outline)]
#[case::append(Swap::Append)]
#[case::prepend(Swap::Prepend)]
fn terminal_calls_select_the_swap_mode(ctx: Context, #[case] swap: Swap) {
    let target = Target::new();
    let builder = ctx.send(&increment(), Values::new()).expect("register");
    let invocation = match swap {
        Swap::Inline => builder.render(&target),
        Swap::Outline => builder.replace(&target),
        Swap::Append => builder.append(&target),
        Swap::Prepend => builder.prepend(&target),
        Swap::None => builder.none(),
    };

    assert_eq!(
        invocation,
        format!(
            "__pw_send(\"{}\",\"{}\",\"/counter-increment\",[])",
            swap,
            target.id()
        )
    );
}

#[rstest]
fn none_leaves_the_target_empty(ctx: Context) {
    let invocation = ctx
        .send(&increment(), Values::new())
        .expect("register")
        .none();
    assert_eq!(invocation, "__pw_send(\"none\",\"\",\"/counter-increment\",[])");
}

#[rstest]
fn swap_uses_the_target_default(ctx: Context) {
    let target = Target::new().with_swap(Swap::Append);
    let invocation = ctx
        .send(&increment(), Values::new())
        .expect("register")
        .swap(&target);
    assert!(invocation.starts_with("__pw_send(\"append\""));
}

#[rstest]
fn submit_targets_the_form_runtime(ctx: Context) {
    let invocation = ctx
        .submit(&increment(), Values::new())
        .expect("register")
        .render(&Target::new());
    assert!(invocation.starts_with("__pw_submit(event,"));
    assert!(!invocation.contains('"'));
}

#[rstest]
fn send_output_is_safe_inside_script_elements(ctx: Context) {
    let invocation = ctx
        .send(&increment(), Values::new().set("note", "</script>"))
        .expect("register")
        .none();
    assert!(!invocation.contains("</"));
}

#[rstest]
fn verbs_register_each_callable_once(ctx: Context) {
    let callable = increment();
    ctx.call(&callable, Values::new()).expect("first");
    ctx.send(&callable, Values::new()).expect("second");

    assert_eq!(
        ctx.app().path_of(&callable).as_deref(),
        Some("/counter-increment")
    );
    assert_eq!(ctx.callable(&callable).as_deref(), Ok("/counter-increment"));
}

#[rstest]
fn unusable_names_surface_as_registration_errors(ctx: Context) {
    let nameless = Callable::new("...", |_ctx| Ok(String::new()));
    assert!(matches!(
        ctx.call(&nameless, Values::new()),
        Err(RegistrationError::EmptyName { .. })
    ));
}

#[rstest]
#[case::render(Swap::Inline)]
#[case::replace(Swap::Outline)]
fn defer_returns_a_skeleton_and_queues_one_job(mut ctx: Context, #[case] swap: Swap) {
    let target = Target::new();
    let slow = Callable::new("slow", |_ctx| Ok("<p>ready</p>".to_owned()));

    let builder = ctx.defer(&slow, Values::new()).expect("register");
    let skeleton = match swap {
        Swap::Outline => builder.replace(&target),
        _ => builder.render(&target),
    };

    assert!(skeleton.contains(&format!("id=\"{}\"", target.id())));
    assert!(skeleton.contains("pw-skeleton"));
    let (_, jobs) = ctx.finish(String::new());
    assert_eq!(jobs.len(), 1);
    let job = jobs.first().expect("job");
    assert_eq!(job.target_id(), target.id());
    assert_eq!(job.swap(), swap);
    assert_eq!(job.session_id(), "s-1");
}

#[rstest]
#[case(Skeleton::Component, 3)]
#[case(Skeleton::List, 5)]
#[case(Skeleton::Page, 5)]
#[case(Skeleton::Form, 6)]
fn skeleton_shapes(#[case] skeleton: Skeleton, #[case] bars: usize) {
    let html = skeleton.render("t-1");
    assert_eq!(html.matches("class=\"pw-skel ").count(), bars);
}

#[rstest]
fn out_of_band_scripts_follow_the_fragment(mut ctx: Context) {
    ctx.success("Saved");
    ctx.error("Nope");
    ctx.title("Inbox");
    ctx.redirect("/next");

    let (html, jobs) = ctx.finish("<p>body</p>".to_owned());

    assert!(jobs.is_empty());
    assert!(html.starts_with("<p>body</p><script>"));
    assert!(html.contains(r#"__pw_toast("success", "Saved");"#));
    assert!(html.contains(r#"__pw_toast("error", "Nope");"#));
    assert!(html.contains(r#"document.title = "Inbox";"#));
    assert!(html.contains(r#"location.href = "/next";"#));
    assert_eq!(html.matches("<script>").count(), 4);
}

#[test]
fn patch_publishes_with_the_target_default_swap() {
    let ctx = Context::new(App::new(), "s-1");
    let target = Target::new().with_swap(Swap::Append);
    let mut subscription = ctx.app().subscribe();

    assert_eq!(ctx.patch(&target, "<li>new</li>"), 1);
    let message = subscription.try_recv().expect("queued patch");
    assert_eq!(message.id, target.id());
    assert_eq!(message.swap, Swap::Append);
    assert_eq!(message.html, "<li>new</li>");
}

#[test]
fn reads_query_and_cookies() {
    let request = RequestInfo {
        method: "GET".to_owned(),
        path: "/list".to_owned(),
        query: vec![("page".to_owned(), "2".to_owned())],
        headers: vec![("cookie".to_owned(), "theme=dark; pw_sid=abc".to_owned())],
    };
    let ctx = Context::new(App::new(), "abc").with_request(request);

    assert_eq!(ctx.query("page"), Some("2"));
    assert_eq!(ctx.query("missing"), None);
    assert_eq!(ctx.request().cookie(SESSION_COOKIE), Some("abc"));
    assert_eq!(ctx.request().header("Cookie"), Some("theme=dark; pw_sid=abc"));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Form {
    label: String,
    count: i64,
    ratio: f64,
    done: bool,
    #[serde(with = "time::serde::rfc3339")]
    due: OffsetDateTime,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            label: String::new(),
            count: 0,
            ratio: 0.0,
            done: false,
            due: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

#[test]
fn encoded_values_decode_back_to_the_original() {
    let original = Form {
        label: "weekly report".to_owned(),
        count: 7,
        ratio: 0.75,
        done: true,
        due: datetime!(2024-06-30 17:00 UTC),
    };
    let sender = Context::new(App::new(), "s-1");
    let invocation = sender
        .send(
            &increment(),
            Values::from_serialize(&original).expect("flatten"),
        )
        .expect("register")
        .none();
    let start = invocation.find('[').expect("items start");
    let end = invocation.rfind(']').expect("items end");
    let items = parse_items(invocation[start..=end].as_bytes());

    let receiver = Context::new(App::new(), "s-2").with_items(items);
    let mut decoded = Form::default();
    receiver.body(&mut decoded);

    assert_eq!(decoded, original);
}
