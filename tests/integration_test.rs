use msgexpr::expression::{EvalError, Value};
use msgexpr::{CompileError, CompileMode, Message, MessageContext, SimpleLanguage};
use std::io::Write;
use std::sync::Arc;
use std::thread;

fn language() -> SimpleLanguage {
    let language = SimpleLanguage::default();
    language.start();
    language
}

fn matches(text: &str, ctx: &MessageContext) -> Result<bool, EvalError> {
    language().compile_predicate(text).unwrap().matches(ctx)
}

#[test]
fn test_in_and_not_in() {
    let ctx = MessageContext::default().with_header("letter", "x");
    assert!(matches("${header.letter} in 'x,y,z'", &ctx).unwrap());
    assert!(!matches("${header.letter} not in 'x,y,z'", &ctx).unwrap());

    let ctx = MessageContext::default().with_header("letter", "w");
    assert!(!matches("${header.letter} in 'x,y,z'", &ctx).unwrap());
    assert!(matches("${header.letter} !in 'x,y,z'", &ctx).unwrap());
}

#[test]
fn test_range() {
    let ctx = MessageContext::default()
        .with_header("five", 5i64)
        .with_header("fifteen", 15i64);
    assert!(matches("${header.five} range '1..10'", &ctx).unwrap());
    assert!(!matches("${header.fifteen} range '1..10'", &ctx).unwrap());
    assert!(matches("${header.fifteen} not range '1..10'", &ctx).unwrap());

    let err = matches("${header.five} range 'abc'", &ctx).unwrap_err();
    let EvalError::IllegalSyntax { index, message, .. } = err else {
        panic!("expected illegal syntax, got {:?}", err);
    };
    assert_eq!(index, 21);
    assert!(message.contains("Valid syntax:'from..to'"));
}

#[test]
fn test_range_on_text_is_an_error() {
    let ctx = MessageContext::default().with_header("n", "abc");
    assert!(matches!(
        matches("${header.n} range '1..10'", &ctx),
        Err(EvalError::Coercion(_))
    ));
    assert!(matches!(
        matches("${header.n} not range '1..10'", &ctx),
        Err(EvalError::Coercion(_))
    ));
}

#[test]
fn test_range_bounds_resolved_at_evaluation() {
    let predicate = language()
        .compile_predicate("${header.n} range ${header.bounds}")
        .unwrap();

    let ok = MessageContext::default()
        .with_header("n", 150i64)
        .with_header("bounds", "100..200");
    assert!(predicate.matches(&ok).unwrap());

    // The same compiled predicate fails for a bad bound and keeps working after
    let bad = ok.clone().with_header("bounds", "100-200");
    assert!(predicate.matches(&bad).is_err());
    assert!(predicate.matches(&ok).unwrap());
}

#[test]
fn test_header_comparison() {
    let predicate = language().compile_predicate("${header.age} >= 18").unwrap();
    let adult = MessageContext::default().with_header("age", 20i64);
    let minor = MessageContext::default().with_header("age", 16i64);
    assert!(predicate.matches(&adult).unwrap());
    assert!(!predicate.matches(&minor).unwrap());

    // Header values from text still compare numerically
    let text = MessageContext::default().with_header("age", "9");
    assert!(!predicate.matches(&text).unwrap());
}

#[test]
fn test_gte_agrees_with_not_lt() {
    let language = language();
    let gte = language.compile_predicate("${header.a} >= ${header.b}").unwrap();
    let lt = language.compile_predicate("${header.a} < ${header.b}").unwrap();

    let samples: [Value; 7] = [
        Value::Integer(-1),
        Value::Integer(10),
        Value::Float(10.0),
        Value::Float(2.25),
        Value::string("3"),
        Value::string("100"),
        Value::Float(f64::NAN),
    ];
    for a in &samples {
        for b in &samples {
            let ctx = MessageContext::default()
                .with_header("a", a.clone())
                .with_header("b", b.clone());
            assert_eq!(
                gte.matches(&ctx).unwrap(),
                !lt.matches(&ctx).unwrap(),
                "{} >= {}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_body_contains() {
    let predicate = language().compile_predicate("${body} contains 'error'").unwrap();
    assert!(predicate
        .matches(&MessageContext::new(Message::new("an error occurred")))
        .unwrap());
    assert!(!predicate
        .matches(&MessageContext::new(Message::new("all good")))
        .unwrap());
}

#[test]
fn test_is_unknown_type() {
    let ctx = MessageContext::default().with_header("type", "order");
    assert!(matches("${header.type} is 'String'", &ctx).unwrap());

    let err = matches("${header.type} is 'com.mycompany.DoesNotExist'", &ctx).unwrap_err();
    assert!(matches!(err, EvalError::IllegalSyntax { index: 18, .. }));
    assert!(err.to_string().contains("cannot be resolved"));
}

#[test]
fn test_nested_function() {
    let language = language();
    let expression = language
        .compile_expression("${header.${header.headerNameKey}}")
        .unwrap();
    let ctx = MessageContext::default()
        .with_header("headerNameKey", "foo")
        .with_header("foo", "bar");
    assert_eq!(expression.value(&ctx).unwrap(), Value::string("bar"));
}

#[test]
fn test_call_style_quoting() {
    let ctx = MessageContext::default()
        .with_header("name", "O'Brien")
        .with_bean("greeter", |call| Ok(Value::string(call)));
    let expression = language()
        .compile_expression("${bean:greeter.hello(${header.name})}")
        .unwrap();
    assert_eq!(
        expression.value(&ctx).unwrap(),
        Value::string("hello(\"O'Brien\")")
    );
}

#[test]
fn test_call_style_quoting_escapes_delimiter() {
    let ctx = MessageContext::default()
        .with_header("name", "O'Brien \"Jr\"")
        .with_bean("greeter", |call| Ok(Value::string(call)));
    let expression = language()
        .compile_expression("${bean:greeter.hello(${header.name})}")
        .unwrap();
    assert_eq!(
        expression.value(&ctx).unwrap(),
        Value::string(r#"hello("O'Brien \"Jr\"")"#)
    );
}

#[test]
fn test_adjacent_predicates_are_and_ed() {
    let language = language();
    let predicate = language
        .compile_predicate("${header.a} == 1 ${header.b} == 2")
        .unwrap();
    assert_eq!(predicate.to_string(), "${header.a} == 1 && ${header.b} == 2");

    let both = MessageContext::default()
        .with_header("a", 1i64)
        .with_header("b", 2i64);
    let one = both.clone().with_header("b", 3i64);
    assert!(predicate.matches(&both).unwrap());
    assert!(!predicate.matches(&one).unwrap());
}

#[test]
fn test_builtin_functions() {
    let ctx = MessageContext::new(Message::new("  order  ")).with_header("name", "Ann");
    let language = language();
    assert_eq!(
        language
            .compile_expression("${uppercase(${header.name})}")
            .unwrap()
            .value(&ctx)
            .unwrap(),
        Value::string("ANN")
    );
    assert!(language
        .compile_predicate("${trim()} == 'order' && ${length()} > 5")
        .unwrap()
        .matches(&ctx)
        .unwrap());
}

#[test]
fn test_repeated_evaluation_is_pure() {
    let expression = language()
        .compile_expression("${header.count}++ ")
        .unwrap();
    let ctx = MessageContext::default().with_header("count", 1i64);
    let first = expression.value(&ctx).unwrap();
    for _ in 0..5 {
        assert_eq!(expression.value(&ctx).unwrap(), first);
    }
    assert_eq!(first, Value::string("2 "));
}

#[test]
fn test_to_string_recompiles_identically() {
    let language = language();
    let ctx = MessageContext::new(Message::new("an error occurred"))
        .with_header("age", 20i64)
        .with_header("name", "Ann")
        .with_header("key", "name");

    let predicates = [
        "${header.age}   >=   18",
        "${body} not contains 'error' || ${header.name} =~ 'ANN'",
        "${header.name} in \"Ann,Bob\" && ${header.age} range '10..30'",
        "${header.age} == 20",
    ];
    for text in predicates {
        let first = language.compile_predicate(text).unwrap();
        let second = language.compile_predicate(&first.to_string()).unwrap();
        assert_eq!(first.matches(&ctx).unwrap(), second.matches(&ctx).unwrap(), "{}", text);
        assert_eq!(first.to_string(), second.to_string());
    }

    let expressions = ["Hello ${header.${header.key}}!", "${header.age}++", r"a\}b ${body}"];
    for text in expressions {
        let first = language.compile(text, CompileMode::Expression).unwrap();
        let second = language.compile(first.text(), CompileMode::Expression).unwrap();
        assert_eq!(first.value(&ctx).unwrap(), second.value(&ctx).unwrap(), "{}", text);
    }
}

#[test]
fn test_compile_errors() {
    let language = language();

    let err = language.compile_expression("${header.foo").unwrap_err();
    assert!(matches!(err, CompileError::Token(_)));

    let err = language.compile_predicate("${header.foo} foo 'bar'").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    assert_eq!(err.index(), 14);
    assert!(err.to_string().contains("Unknown operator"));
}

#[test]
fn test_concurrent_evaluation() {
    let language = Arc::new(language());
    let predicate = language
        .compile_predicate("${header.n} > 50 && ${header.n} range '0..100'")
        .unwrap();

    let handles: Vec<_> = (0..8i64)
        .map(|worker| {
            let predicate = predicate.clone();
            let language = language.clone();
            thread::spawn(move || {
                for n in 0..200i64 {
                    let value = worker * 13 + n;
                    let ctx = MessageContext::default().with_header("n", value);
                    let expected = value > 50 && value <= 100;
                    assert_eq!(predicate.matches(&ctx).unwrap(), expected);

                    // Concurrent compiles of the same text are interchangeable
                    let again = language.compile_predicate("${header.n} > 50").unwrap();
                    assert_eq!(again.matches(&ctx).unwrap(), value > 50);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(language.cache().len(), 2);
}

#[test]
fn test_message_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"body": "order received", "headers": {{"priority": 7, "customer": "ACME"}}}}"#
    )
    .unwrap();

    let ctx = MessageContext::new(Message::load(file.path()).unwrap());
    let language = language();
    assert!(language
        .compile_predicate("${header.priority} > 5 && ${body} startsWith 'order'")
        .unwrap()
        .matches(&ctx)
        .unwrap());
    assert_eq!(
        language
            .compile_expression("Customer ${header.customer}, priority ${header.priority}")
            .unwrap()
            .value(&ctx)
            .unwrap(),
        Value::string("Customer ACME, priority 7")
    );
}
