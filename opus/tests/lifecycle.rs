//! Cross-thread disposal of encoders and decoders.

use std::sync::{Arc, Barrier};
use std::thread;

use giztoy_opus::{Application, Decoder, Encoder, OpusError};

const THREADS: usize = 8;

#[test]
fn test_concurrent_encoder_dispose() {
    let encoder = Arc::new(Encoder::new(48000, 2, Application::Audio).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let encoder = Arc::clone(&encoder);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                encoder.dispose();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(encoder.is_disposed());
    let pcm = vec![0u8; 3840];
    let mut out = vec![0u8; 4000];
    assert_eq!(encoder.encode(&pcm, 3840, &mut out, 4000), Err(OpusError::UseAfterRelease));
    assert_eq!(encoder.complexity(), Err(OpusError::UseAfterRelease));
}

#[test]
fn test_concurrent_decoder_dispose() {
    let decoder = Arc::new(Decoder::new(16000, 1).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let decoder = Arc::clone(&decoder);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                decoder.dispose();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(decoder.is_disposed());
    let mut pcm = vec![0u8; 640];
    assert_eq!(decoder.conceal(&mut pcm), Err(OpusError::UseAfterRelease));
}

#[test]
fn test_dispose_while_encoding() {
    let encoder = Arc::new(Encoder::new_voip(16000, 1).unwrap());

    let worker = {
        let encoder = Arc::clone(&encoder);
        thread::spawn(move || {
            let pcm = vec![0u8; 640];
            let mut out = vec![0u8; 1500];
            let mut encoded = 0;
            loop {
                match encoder.encode(&pcm, 640, &mut out, 1500) {
                    Ok(_) => encoded += 1,
                    Err(OpusError::UseAfterRelease) => return encoded,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        })
    };

    thread::sleep(std::time::Duration::from_millis(20));
    encoder.dispose();
    worker.join().unwrap();
    assert!(encoder.is_disposed());
}

#[test]
fn test_shared_round_trip() {
    let encoder = Arc::new(Encoder::new_audio(48000, 2).unwrap());
    let decoder = Arc::new(Decoder::new(48000, 2).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let encoder = Arc::clone(&encoder);
            let decoder = Arc::clone(&decoder);
            thread::spawn(move || {
                let pcm = vec![0u8; 3840];
                let mut packet = vec![0u8; 4000];
                let n = encoder.encode(&pcm, 3840, &mut packet, 4000).unwrap();
                let mut out = vec![0u8; 3840];
                decoder.decode(Some(&packet[..n]), n, &mut out, 3840).unwrap()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 3840);
    }
}
