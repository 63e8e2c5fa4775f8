// Services module
// Speech acquisition and audio output

pub mod audio;
pub mod tts;
