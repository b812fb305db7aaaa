//! Trains a small network on XOR-style data and prints its predictions.

extern crate perceptron;

use perceptron::matrix::Mat;
use perceptron::network::{Network, Objective};
use perceptron::trainer::{self, GradientDescent, Logging, StopCondition};
use perceptron::training_set::TrainingSet;

fn main() {
    let inputs = Mat::from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ]).unwrap();
    let outputs = Mat::from_rows(&[
        vec![0.1],
        vec![0.9],
        vec![0.9],
        vec![0.1],
    ]).unwrap();
    let data = TrainingSet::new(inputs, outputs)
        .unwrap()
        .with_name("xor");

    let mut network =
        Network::new(&[2, 2, 1], Objective::MeanSquaredError).unwrap();
    network.initialize_weights(0.5);

    let untrained = network
        .cost(data.inputs(), data.outputs(), None, 1e-6)
        .unwrap();
    println!("Untrained cost: {}", untrained);

    let minimizer = GradientDescent::new()
        .learning_rate(3.0)
        .logging(Logging::Iterations(1000))
        .stop_condition(StopCondition::Iterations(20_000));
    let cost = trainer::train(&mut network, &data, &minimizer, 1e-6).unwrap();
    println!("Trained cost: {}", cost);

    println!();
    for r in 0..data.len() {
        let input = data.inputs().row(r);
        let prediction = network.predict_one(input, None).unwrap();
        println!(
            "{:?} -> {:.4} (expected {})",
            input,
            prediction[0],
            data.outputs().get(r, 0)
        );
    }
}
