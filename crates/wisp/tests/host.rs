//! The host bridge: native functions, calling script functions by name,
//! and reading globals back across the embedding boundary.

use pretty_assertions::assert_eq;
use wisp::{CollectStringPrint, ErrorKind, NoPrint, Object, Runner, Value};

#[test]
fn native_functions_resolve_like_globals() {
    let mut runner = Runner::new("print double(21);", "test.wisp").unwrap();
    runner.register_native("double", |_, args| {
        let [Value::Number(n)] = args else {
            return Err("expected one number".to_owned());
        };
        Ok(Value::Number(n * 2.0))
    });
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).unwrap();
    assert_eq!(print.output(), "42.000000\n");
}

#[test]
fn natives_mutate_arrays_through_shared_handles() {
    let code = "a = array{ 1, 2, 3 }; scale(a, 10); print a[0]; print a[2];";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.register_native("scale", |heap, args| {
        let [Value::Array(id), Value::Number(factor)] = args else {
            return Err("expected an array and a factor".to_owned());
        };
        let factor = *factor;
        let Some(elements) = heap.array_mut(*id) else {
            return Err("missing array".to_owned());
        };
        for element in elements {
            if let Value::Number(n) = element {
                *n *= factor;
            }
        }
        Ok(Value::Undefined)
    });
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).unwrap();
    assert_eq!(print.output(), "10.000000\n30.000000\n");
}

#[test]
fn natives_allocate_through_the_heap() {
    let mut runner = Runner::new("p = make_point(3, 4); print p.x; print p.y;", "test.wisp").unwrap();
    runner.register_native("make_point", |heap, args| {
        let [Value::Number(x), Value::Number(y)] = args else {
            return Err("expected two numbers".to_owned());
        };
        let (x, y) = (*x, *y);
        let id = heap.alloc_table();
        if let Some(table) = heap.table_mut(id) {
            table.insert("x".to_owned(), Value::Number(x));
            table.insert("y".to_owned(), Value::Number(y));
        }
        Ok(Value::Table(id))
    });
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).unwrap();
    assert_eq!(print.output(), "3.000000\n4.000000\n");
}

#[test]
fn native_failure_becomes_an_eval_error_at_the_call_site() {
    let mut runner = Runner::new("x = 1;\nboom();", "test.wisp").unwrap();
    runner.register_native("boom", |_, _| Err("it broke".to_owned()));
    let err = runner.run(&mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Eval);
    assert_eq!(err.location.line, 2);
    assert!(err.message.contains("boom"), "{}", err.message);
    assert!(err.message.contains("it broke"), "{}", err.message);
}

#[test]
fn builtin_arity_errors_name_the_builtin() {
    let err = Runner::new("array_size(1, 2);", "test.wisp")
        .unwrap()
        .run(&mut NoPrint)
        .unwrap_err();
    assert!(err.message.contains("array_size"), "{}", err.message);
}

#[test]
fn host_drives_a_game_loop() {
    let code = "
        g_dt = 0;
        g_allGameObjects = array{};

        makeShip = fn(x, y) {
            return { x = x; y = y; type = \"player\"; };
        };

        initGame = fn() {
            g_allGameObjects = array{ makeShip(100, 200) };
        };

        updateGame = fn() {
            for i = 0; i < array_size(g_allGameObjects); i = i + 1 {
                obj = g_allGameObjects[i];
                obj.y = obj.y - 10 * g_dt;
            }
        };
    ";
    let mut runner = Runner::new(code, "game.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();

    runner.call("initGame", vec![], &mut NoPrint).unwrap();
    runner.set("g_dt", Object::Number(0.5)).unwrap();
    runner.call("updateGame", vec![], &mut NoPrint).unwrap();
    runner.call("updateGame", vec![], &mut NoPrint).unwrap();

    let Some(Object::Array(objects)) = runner.get("g_allGameObjects") else {
        panic!("expected the game-object array");
    };
    assert_eq!(objects.len(), 1);
    let Object::Table(members) = &objects[0] else {
        panic!("expected a table");
    };
    let y = members.iter().find(|(name, _)| name == "y").map(|(_, v)| v);
    assert_eq!(y, Some(&Object::Number(190.0)));
}

#[test]
fn call_passes_arguments_and_returns_objects() {
    let code = "add = fn(a, b) { return a + b; };";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    let result = runner
        .call("add", vec![Object::Number(2.0), Object::Number(3.0)], &mut NoPrint)
        .unwrap();
    let n: f32 = (&result).try_into().unwrap();
    assert_eq!(n, 5.0);
}

#[test]
fn call_can_invoke_natives_too() {
    let mut runner = Runner::new("", "test.wisp").unwrap();
    let result = runner
        .call(
            "array_size",
            vec![Object::Array(vec![Object::Number(1.0), Object::Number(2.0)])],
            &mut NoPrint,
        )
        .unwrap();
    assert_eq!(result, Object::Number(2.0));
}

#[test]
fn call_unknown_name_fails() {
    let mut runner = Runner::new("", "test.wisp").unwrap();
    let err = runner.call("missing", vec![], &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Eval);
    assert!(err.message.contains("missing"), "{}", err.message);
}

#[test]
fn call_non_function_fails() {
    let mut runner = Runner::new("x = 1;", "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    let err = runner.call("x", vec![], &mut NoPrint).unwrap_err();
    assert!(err.message.contains("not callable"), "{}", err.message);
}

#[test]
fn set_globals_are_visible_to_scripts() {
    let code = "f = fn() { return g_bonus + 1; };";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    runner.set("g_bonus", Object::Number(9.0)).unwrap();
    let result = runner.call("f", vec![], &mut NoPrint).unwrap();
    assert_eq!(result, Object::Number(10.0));
}

#[test]
fn get_converts_collections_recursively() {
    let code = "t = { inner = array{ 1 }; };";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    assert_eq!(
        runner.get("t"),
        Some(Object::Table(vec![(
            "inner".to_owned(),
            Object::Array(vec![Object::Number(1.0)])
        )]))
    );
}

#[test]
fn cyclic_values_convert_to_repr_placeholders() {
    let code = "t = {}; t.me = t;";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    assert_eq!(
        runner.get("t"),
        Some(Object::Table(vec![(
            "me".to_owned(),
            Object::Repr("{...}".to_owned())
        )]))
    );
}

#[test]
fn repr_objects_are_rejected_as_input() {
    let mut runner = Runner::new("", "test.wisp").unwrap();
    let err = runner.set("x", Object::Repr("<...>".to_owned())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Eval);
}

#[test]
fn function_values_round_trip_by_id() {
    let code = "f = fn() { return 11; };";
    let mut runner = Runner::new(code, "test.wisp").unwrap();
    runner.run(&mut NoPrint).unwrap();
    let f = runner.get("f").unwrap();
    assert_eq!(f, Object::Function(0));
    // Stash it under another name and call it there.
    runner.set("g", f).unwrap();
    assert_eq!(runner.call("g", vec![], &mut NoPrint).unwrap(), Object::Number(11.0));
}

#[test]
fn get_unknown_global_is_none() {
    let runner = Runner::new("", "test.wisp").unwrap();
    assert_eq!(runner.get("nope"), None);
}
