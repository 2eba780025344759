//! Integration tests for time-driven gates, determinism and presenter notifications.

use latchwork::{
    Blueprint, Circuit, EdgeId, GateId, ManualTime, Presenter, ProbeInterval, Scheduler, SimulationConfig,
    Trigger,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    RedrawGate(GateId),
    RedrawEdge(EdgeId),
    GateDisposed(GateId),
    EdgeDisposed(EdgeId),
    GateDetached(GateId),
    EdgeDetached(EdgeId),
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Presenter for Recorder {
    fn redraw_gate(&mut self, gate: GateId) {
        self.0.borrow_mut().push(Event::RedrawGate(gate));
    }

    fn redraw_edge(&mut self, edge: EdgeId) {
        self.0.borrow_mut().push(Event::RedrawEdge(edge));
    }

    fn gate_disposed(&mut self, gate: GateId) {
        self.0.borrow_mut().push(Event::GateDisposed(gate));
    }

    fn edge_disposed(&mut self, edge: EdgeId) {
        self.0.borrow_mut().push(Event::EdgeDisposed(edge));
    }

    fn gate_detached(&mut self, gate: GateId) {
        self.0.borrow_mut().push(Event::GateDetached(gate));
    }

    fn edge_detached(&mut self, edge: EdgeId) {
        self.0.borrow_mut().push(Event::EdgeDetached(edge));
    }
}

fn clock_probe_lamp() -> Blueprint {
    Blueprint::new()
        .gate("clock", "1Hz Clock")
        .gate("probe", "Probe")
        .gate("lamp", "Lamp")
        .connect("clock to probe")
        .connect("probe to lamp")
}

#[test]
fn clock_follows_wall_time_not_ticks() {
    init_tracing();
    let time = ManualTime::new(0);
    let mut circuit = Circuit::new().with_time_source(time.clone());
    let g = circuit.load_blueprint(&clock_probe_lamp()).unwrap();
    let lamp = |c: &Circuit| c.gate(g["lamp"]).and_then(|gate| gate.kind().is_lit()).unwrap();

    circuit.tick().unwrap();
    assert!(lamp(&circuit));

    // Many ticks without time passing change nothing
    for _ in 0..50 {
        circuit.tick().unwrap();
    }
    assert!(lamp(&circuit));

    time.set(499);
    circuit.tick().unwrap();
    assert!(lamp(&circuit));

    time.set(500);
    circuit.tick().unwrap();
    assert!(!lamp(&circuit));

    time.set(1000);
    circuit.tick().unwrap();
    assert!(lamp(&circuit));
}

#[test]
fn probe_measures_high_and_low_runs() {
    init_tracing();
    let time = ManualTime::new(0);
    let mut circuit = Circuit::new().with_time_source(time.clone());
    let g = circuit.load_blueprint(&clock_probe_lamp()).unwrap();
    let last = |c: &Circuit| {
        c.gate(g["probe"])
            .and_then(|gate| gate.kind().probe())
            .and_then(|p| p.last_interval())
    };

    circuit.tick().unwrap();
    assert_eq!(last(&circuit), None);

    time.advance(500);
    circuit.tick().unwrap();
    assert_eq!(
        last(&circuit),
        Some(ProbeInterval {
            level: true,
            duration_ms: 500
        })
    );

    time.advance(500);
    circuit.tick().unwrap();
    assert_eq!(
        last(&circuit),
        Some(ProbeInterval {
            level: false,
            duration_ms: 500
        })
    );
}

#[test]
fn probes_take_markers_in_turn() {
    let config = SimulationConfig {
        probe_markers: vec!["x".into(), "y".into()],
        ..SimulationConfig::default()
    };
    let mut circuit = Circuit::with_config(config);
    let markers: Vec<_> = (0..3)
        .map(|_| {
            let id = circuit.add_gate("Probe", None).unwrap();
            circuit.gate(id).unwrap().info().map(str::to_string)
        })
        .collect();
    assert_eq!(markers, vec![Some("x".to_string()), Some("y".to_string()), Some("x".to_string())]);
}

fn snapshot(circuit: &Circuit) -> Vec<bool> {
    circuit.edges().map(|(_, e)| e.value()).collect()
}

#[test]
fn identical_circuits_evolve_identically() {
    init_tracing();
    let blueprint = Blueprint::new()
        .gate("clock", "5Hz Clock")
        .gate("switch", "Switch")
        .gate("and", "And")
        .gate("xor", "Xor")
        .gate("not", "Not")
        .gate("counter", "Counter")
        .connect("clock to and:A")
        .connect("switch to and:B")
        .connect("and to xor:A")
        .connect("not to xor:B")
        .connect("xor to not")
        .connect("xor to counter");

    let time = ManualTime::new(0);
    let mut left = Circuit::new().with_time_source(time.clone());
    let mut right = Circuit::new().with_time_source(time.clone());
    let gl = left.load_blueprint(&blueprint).unwrap();
    let gr = right.load_blueprint(&blueprint).unwrap();

    for step in 0..200u64 {
        if step % 17 == 0 {
            left.trigger(gl["switch"], Trigger::Toggle).unwrap();
            right.trigger(gr["switch"], Trigger::Toggle).unwrap();
        }
        time.advance(13);
        left.tick().unwrap();
        right.tick().unwrap();
        assert_eq!(snapshot(&left), snapshot(&right), "step {step}");
    }

    let count = |c: &Circuit, id: GateId| c.gate(id).and_then(|gate| gate.kind().count());
    assert_eq!(count(&left, gl["counter"]), count(&right, gr["counter"]));
}

#[test]
fn presenter_hears_about_every_change() {
    init_tracing();
    let recorder = Recorder::default();
    let mut circuit = Circuit::new().with_presenter(recorder.clone());

    let switch = circuit.add_gate("Switch", None).unwrap();
    let lamp = circuit.add_gate("Lamp", None).unwrap();
    let edge = circuit.connect_ports(switch, None, lamp, None).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            Event::RedrawGate(switch),
            Event::RedrawGate(lamp),
            Event::RedrawEdge(edge)
        ]
    );

    circuit.trigger(switch, Trigger::Toggle).unwrap();
    circuit.tick().unwrap();
    circuit.tick().unwrap();
    // One redraw for the toggle, one for the lamp lighting up
    assert_eq!(recorder.take(), vec![Event::RedrawGate(switch), Event::RedrawGate(lamp)]);

    circuit.remove_gate(lamp).unwrap();
    assert_eq!(recorder.take(), vec![Event::EdgeDisposed(edge), Event::GateDisposed(lamp)]);
    assert!(!circuit.delete_edge(edge));
    assert!(recorder.take().is_empty());
}

#[test]
fn packing_detaches_instead_of_disposing() {
    init_tracing();
    let recorder = Recorder::default();
    let mut circuit = Circuit::new().with_presenter(recorder.clone());
    let input = circuit.add_gate("Input", None).unwrap();
    let output = circuit.add_gate("Output", None).unwrap();
    let edge = circuit.connect_ports(input, None, output, None).unwrap();
    recorder.take();

    let packed = circuit.pack("Wire").unwrap();
    let events = recorder.take();
    assert!(events.contains(&Event::EdgeDetached(edge)));
    assert!(events.contains(&Event::GateDetached(input)));
    assert!(events.contains(&Event::GateDetached(output)));
    assert_eq!(events.last(), Some(&Event::RedrawGate(packed)));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::GateDisposed(_) | Event::EdgeDisposed(_))));

    circuit.unpack(packed).unwrap();
    let events = recorder.take();
    assert!(events.contains(&Event::GateDisposed(packed)));
    assert!(events.contains(&Event::RedrawEdge(edge)));
    assert!(events.contains(&Event::RedrawGate(input)));
    assert!(events.contains(&Event::RedrawGate(output)));
}

#[test]
fn scheduler_drives_a_loaded_blueprint() {
    init_tracing();
    let time = ManualTime::new(0);
    let mut circuit = Circuit::new().with_time_source(time);
    let g = circuit.load_blueprint(&clock_probe_lamp()).unwrap();

    let mut scheduler = Scheduler::with_period(Duration::from_millis(1));
    assert_eq!(scheduler.run_ticks(&mut circuit, 3).unwrap(), 3);
    assert_eq!(circuit.ticks(), 3);
    assert_eq!(circuit.gate(g["lamp"]).and_then(|gate| gate.kind().is_lit()), Some(true));
}
